//! Property Tests (slp-client)
//!
//! Process-wide properties and the advertised refresh interval.

use slp_client::{get_property, refresh_interval, set_property, Session};
use slp_core::{DirectoryAgent, ServiceRegistration, LIFETIME_MAXIMUM};
use slp_test_utils::{init_tracing, MemoryAgent, MemoryAgentConfig};
use std::sync::Arc;

#[test]
fn test_default_properties() {
    assert_eq!(get_property("net.slp.useScopes"), "DEFAULT");
    assert_eq!(get_property("net.slp.multicastTTL"), "255");
    assert_eq!(get_property("net.slp.unknown.property"), "");
}

#[test]
fn test_set_then_get() {
    set_property("net.slp.test.setThenGet", "first");
    assert_eq!(get_property("net.slp.test.setThenGet"), "first");

    set_property("net.slp.test.setThenGet", "second");
    assert_eq!(get_property("net.slp.test.setThenGet"), "second");
}

#[test]
fn test_set_visible_across_threads() {
    std::thread::spawn(|| set_property("net.slp.test.crossThread", "yes"))
        .join()
        .expect("Thread panicked");
    assert_eq!(get_property("net.slp.test.crossThread"), "yes");
}

#[tokio::test]
async fn test_refresh_interval_tracks_agents() {
    init_tracing();
    let agent = MemoryAgent::with_config(MemoryAgentConfig {
        min_refresh_interval: 900,
        ..MemoryAgentConfig::default()
    });
    let shared: Arc<dyn DirectoryAgent> = Arc::new(agent.clone());
    let session = Session::open(shared, "", false).await.unwrap();

    let interval = refresh_interval();
    assert!(interval >= 900);
    assert!(interval <= u32::from(LIFETIME_MAXIMUM));

    // A lifetime of at least the interval is accepted
    let lifetime = u16::try_from(interval).unwrap();
    session
        .register(&ServiceRegistration::new("service:echo://127.0.0.1:7").lifetime(lifetime))
        .await
        .unwrap();
}
