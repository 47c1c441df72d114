//! Common test helpers for the SLP client
//!
//! This crate provides:
//! - [`MemoryAgent`], a directory agent that keeps registrations in memory
//! - LDAPv3 filter evaluation used by the agent ([`filter`])
//! - Collectors for items seen by enumeration handlers
//! - Tracing setup for test binaries

pub mod agent;
pub mod filter;

pub use agent::{MemoryAgent, MemoryAgentConfig, Operation};
pub use filter::Filter;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Once};
use std::thread::ThreadId;

static TRACING: Once = Once::new();

/// Install a fmt subscriber once per test binary
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A fresh agent with tracing enabled
pub fn memory_agent() -> MemoryAgent {
    init_tracing();
    MemoryAgent::new()
}

/// A fresh agent serving `scopes`, tracing enabled
pub fn memory_agent_with_scopes(scopes: &[&str]) -> MemoryAgent {
    init_tracing();
    MemoryAgent::with_config(MemoryAgentConfig {
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
        ..MemoryAgentConfig::default()
    })
}

// ============================================================================
// Collectors - for verifying what handlers saw
// ============================================================================

/// Thread-safe record of items passed to a handler
#[derive(Clone)]
pub struct ItemCollector<T> {
    items: Arc<Mutex<Vec<T>>>,
    threads: Arc<Mutex<Vec<ThreadId>>>,
    count: Arc<AtomicU32>,
}

impl<T: Clone + Send + 'static> ItemCollector<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            threads: Arc::new(Mutex::new(Vec::new())),
            count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Record `item` and the calling thread
    pub fn record(&self, item: &T) {
        self.items.lock().push(item.clone());
        self.threads.lock().push(std::thread::current().id());
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of items recorded
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    /// All recorded items in call order
    pub fn items(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    /// Threads the handler ran on, one entry per call
    pub fn threads(&self) -> Vec<ThreadId> {
        self.threads.lock().clone()
    }
}

impl<T: Clone + Send + 'static> Default for ItemCollector<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert that a Result is Err and return the error
pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>, msg: &str) -> anyhow::Result<E> {
    match result {
        Ok(v) => Err(anyhow::anyhow!("{}: expected error, got Ok({:?})", msg, v)),
        Err(e) => Ok(e),
    }
}
