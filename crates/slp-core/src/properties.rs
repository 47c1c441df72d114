//! Process-wide SLP properties
//!
//! The store is created with the protocol defaults on first use. Readers and
//! writers in different threads are serialised by the store's lock only;
//! nothing is cached on the client side, so a `set_property` is visible to
//! the next `get_property` anywhere in the process.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use tracing::debug;

static PROPERTIES: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

/// Largest min-refresh-interval advertised by any agent seen so far
static MIN_REFRESH_INTERVAL: AtomicU32 = AtomicU32::new(0);

const DEFAULTS: &[(&str, &str)] = &[
    ("net.slp.useScopes", "DEFAULT"),
    ("net.slp.DAAddresses", ""),
    ("net.slp.isBroadcastOnly", "false"),
    ("net.slp.passiveDADetection", "true"),
    ("net.slp.multicastTTL", "255"),
    ("net.slp.multicastMaximumWait", "15000"),
    ("net.slp.unicastMaximumWait", "15000"),
    ("net.slp.MTU", "1400"),
    ("net.slp.locale", "en"),
    ("net.slp.securityEnabled", "false"),
];

fn store() -> &'static RwLock<HashMap<String, String>> {
    PROPERTIES.get_or_init(|| {
        RwLock::new(
            DEFAULTS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    })
}

/// Current value of a property; unknown names read as empty
pub fn get_property(name: &str) -> String {
    store().read().get(name).cloned().unwrap_or_default()
}

/// Set a property for the whole process
pub fn set_property(name: &str, value: &str) {
    debug!("Setting property {} = {}", name, value);
    store().write().insert(name.to_string(), value.to_string());
}

/// Minimum refresh interval, in seconds, demanded by the known agents
///
/// `0` means no agent advertises a minimum. It is not itself a usable
/// registration lifetime.
pub fn refresh_interval() -> u32 {
    MIN_REFRESH_INTERVAL.load(Ordering::SeqCst)
}

/// Record an agent's advertised min-refresh-interval
///
/// Keeps the maximum across all agents seen by the process.
pub fn note_min_refresh_interval(seconds: u32) {
    MIN_REFRESH_INTERVAL.fetch_max(seconds, Ordering::SeqCst);
}
