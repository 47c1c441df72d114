//! Enumeration Tests (slp-client)
//!
//! Tests for per-item handlers across the discovery queries:
//! - Early stop, with and without agent cooperation
//! - Mid-stream failures and handler failures
//! - Asynchronous delivery on a multi-threaded runtime
//! - Concurrent use of one session

use slp_client::{ErrorKind, Session};
use slp_core::{Attributes, Continuation, DirectoryAgent, ServiceEntry, Status};
use slp_test_utils::{memory_agent, ItemCollector, MemoryAgent, MemoryAgentConfig, Operation};
use std::sync::Arc;

async fn seed_echoes(agent: &MemoryAgent, count: usize) {
    for i in 0..count {
        agent
            .seed(
                &format!("service:echo://10.0.0.{}:7", i + 1),
                &Attributes::new().with("index", i.to_string()),
            )
            .await
            .expect("Seed failed");
    }
}

async fn open(agent: &MemoryAgent, asynchronous: bool) -> Session {
    let shared: Arc<dyn DirectoryAgent> = Arc::new(agent.clone());
    Session::open(shared, "en", asynchronous)
        .await
        .expect("Open failed")
}

// ============================================================================
// Early Stop Tests
// ============================================================================

#[tokio::test]
async fn test_handler_sees_every_item() {
    let agent = memory_agent();
    seed_echoes(&agent, 4).await;
    let session = open(&agent, false).await;

    let collector = ItemCollector::new();
    let c = collector.clone();
    let found = session
        .find_services_with("service:echo", "", "", move |entry: &ServiceEntry| {
            c.record(entry);
            Ok(Continuation::Continue)
        })
        .await
        .unwrap();

    assert_eq!(collector.count(), 4);
    assert_eq!(collector.items(), found);
}

#[tokio::test]
async fn test_stop_after_first_item() {
    let agent = memory_agent();
    seed_echoes(&agent, 5).await;
    let session = open(&agent, false).await;

    let collector = ItemCollector::new();
    let c = collector.clone();
    let found = session
        .find_services_with("service:echo", "", "", move |entry: &ServiceEntry| {
            c.record(entry);
            Ok(Continuation::Stop)
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].url, "service:echo://10.0.0.1:7");
    assert_eq!(collector.count(), 1);
}

#[tokio::test]
async fn test_stop_ignored_by_agent() {
    let agent = MemoryAgent::with_config(MemoryAgentConfig {
        honor_stop: false,
        ..MemoryAgentConfig::default()
    });
    seed_echoes(&agent, 5).await;
    let session = open(&agent, false).await;

    let collector = ItemCollector::new();
    let c = collector.clone();
    let found = session
        .find_services_with("service:echo", "", "", move |entry: &ServiceEntry| {
            c.record(entry);
            Ok(Continuation::Stop)
        })
        .await
        .unwrap();

    // Deliveries after the stop never reach the handler
    assert_eq!(found.len(), 1);
    assert_eq!(collector.count(), 1);
}

#[tokio::test]
async fn test_stop_after_n_types() {
    let agent = memory_agent();
    for t in ["a", "b", "c", "d"] {
        agent
            .seed(&format!("service:{}://host", t), &Attributes::new())
            .await
            .unwrap();
    }
    let session = open(&agent, false).await;

    let mut seen = 0;
    let types = session
        .find_service_types_with("*", "", |_| {
            seen += 1;
            Ok(if seen == 2 {
                Continuation::Stop
            } else {
                Continuation::Continue
            })
        })
        .await
        .unwrap();

    assert_eq!(types, vec!["service:a", "service:b"]);
}

#[tokio::test]
async fn test_empty_result_never_calls_handler() {
    let agent = memory_agent();
    let session = open(&agent, false).await;

    let collector: ItemCollector<String> = ItemCollector::new();
    let c = collector.clone();
    let attrs = session
        .find_service_attributes_with("service:echo://nowhere", "", "", move |list: &String| {
            c.record(list);
            Ok(Continuation::Continue)
        })
        .await
        .unwrap();

    assert!(attrs.is_empty());
    assert_eq!(collector.count(), 0);
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_mid_stream_failure_discards_items() {
    let agent = memory_agent();
    seed_echoes(&agent, 3).await;
    let session = open(&agent, false).await;
    agent.fail_mid_stream(2, Status::NETWORK_TIMED_OUT);

    let collector = ItemCollector::new();
    let c = collector.clone();
    let err = session
        .find_services_with("service:echo", "", "", move |entry: &ServiceEntry| {
            c.record(entry);
            Ok(Continuation::Continue)
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkTimedOut);
    assert_eq!(err.operation(), "find_services");
    assert_eq!(collector.count(), 2);
}

#[tokio::test]
async fn test_failure_before_first_item() {
    let agent = memory_agent();
    seed_echoes(&agent, 2).await;
    let session = open(&agent, false).await;
    agent.fail_mid_stream(0, Status::BUFFER_OVERFLOW);

    let err = session.find_service_types("*", "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BufferOverflow);
}

#[tokio::test]
async fn test_issue_failure() {
    let agent = memory_agent();
    seed_echoes(&agent, 2).await;
    let session = open(&agent, false).await;
    agent.fail_next(Operation::FindAttributes, Status::AUTHENTICATION_ABSENT);

    let err = session
        .find_service_attributes("service:echo", "", "")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationAbsent);
    assert_eq!(err.code(), Some(-6));
}

#[tokio::test]
async fn test_handler_error_aborts() {
    let agent = memory_agent();
    seed_echoes(&agent, 3).await;
    let session = open(&agent, false).await;

    let mut calls = 0;
    let err = session
        .find_services_with("service:echo", "", "", |_| {
            calls += 1;
            Err("handler gave up".into())
        })
        .await
        .unwrap_err();

    assert_eq!(calls, 1);
    assert_eq!(err.kind(), ErrorKind::HandlerFailed);
    assert!(err.to_string().contains("handler gave up"));
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_handler_error_supersedes_agent_failure() {
    let agent = memory_agent();
    seed_echoes(&agent, 3).await;
    let session = open(&agent, false).await;
    agent.fail_mid_stream(1, Status::NETWORK_ERROR);

    let err = session
        .find_services_with("service:echo", "", "", |_| Err("first item rejected".into()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HandlerFailed);
}

#[tokio::test]
async fn test_session_usable_after_failure() {
    let agent = memory_agent();
    seed_echoes(&agent, 2).await;
    let session = open(&agent, false).await;
    agent.fail_mid_stream(1, Status::NETWORK_ERROR);

    assert!(session.find_services("service:echo", "", "").await.is_err());
    let found = session.find_services("service:echo", "", "").await.unwrap();
    assert_eq!(found.len(), 2);
}

// ============================================================================
// Asynchronous Mode Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_delivery_multi_thread() {
    let agent = memory_agent();
    seed_echoes(&agent, 16).await;
    let session = Arc::new(open(&agent, true).await);
    let test_thread = std::thread::current().id();

    let collector = ItemCollector::new();
    let c = collector.clone();
    let s = session.clone();
    let found = tokio::spawn(async move {
        s.find_services_with("service:echo", "", "", move |entry: &ServiceEntry| {
            c.record(entry);
            Ok(Continuation::Continue)
        })
        .await
    })
    .await
    .expect("Task panicked")
    .unwrap();

    assert_eq!(found.len(), 16);
    assert_eq!(collector.count(), 16);
    // Spawned tasks run on runtime workers, never on the thread blocked in the test
    assert!(collector.threads().iter().all(|id| *id != test_thread));
    assert_eq!(collector.items(), found);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_stop() {
    let agent = memory_agent();
    seed_echoes(&agent, 8).await;
    let session = open(&agent, true).await;

    let found = session
        .find_services_with("service:echo", "", "", |_| Ok(Continuation::Stop))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test]
async fn test_concurrent_use_is_rejected() {
    let agent = memory_agent();
    seed_echoes(&agent, 3).await;
    let session = open(&agent, true).await;

    // The asynchronous agent yields before each delivery, so the second
    // operation starts while the first is still in flight
    let (first, second) = tokio::join!(
        session.find_services("service:echo", "", ""),
        session.find_scopes()
    );

    assert_eq!(first.unwrap().len(), 3);
    let err = second.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HandleInUse);
    assert_eq!(err.code(), Some(-25));

    // The handle is free again once the first operation ends
    assert!(session.find_scopes().await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_sessions_run_concurrently() {
    let agent = memory_agent();
    seed_echoes(&agent, 4).await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let agent = agent.clone();
        tasks.push(tokio::spawn(async move {
            let session = open(&agent, true).await;
            session.find_services("service:echo", "", "").await
        }));
    }

    for task in tasks {
        let found = task.await.expect("Task panicked").unwrap();
        assert_eq!(found.len(), 4);
    }
    assert_eq!(agent.open_handles(), 0);
}
