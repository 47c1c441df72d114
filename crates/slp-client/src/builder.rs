//! Session builder pattern

use serde::{Deserialize, Serialize};
use slp_core::DirectoryAgent;
use std::net::IpAddr;
use std::sync::Arc;

use crate::{Result, Session};

/// Options a session is opened with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// RFC 1766 language tag; empty selects the host default
    pub language_tag: String,
    /// Let the agent deliver results from its own threads
    pub asynchronous: bool,
    /// Directory agent to reach by unicast instead of multicast
    pub host: Option<IpAddr>,
}

/// Builder for [`Session`]
pub struct SessionBuilder {
    agent: Arc<dyn DirectoryAgent>,
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create a new builder
    pub fn new(agent: Arc<dyn DirectoryAgent>) -> Self {
        Self {
            agent,
            config: SessionConfig::default(),
        }
    }

    /// Set language tag
    pub fn language(mut self, language_tag: &str) -> Self {
        self.config.language_tag = language_tag.to_string();
        self
    }

    /// Enable/disable asynchronous delivery
    pub fn asynchronous(mut self, enabled: bool) -> Self {
        self.config.asynchronous = enabled;
        self
    }

    /// Send every request to the agent at `addr`
    pub fn host(mut self, addr: IpAddr) -> Self {
        self.config.host = Some(addr);
        self
    }

    /// Replace every option at once
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Build and open
    pub async fn open(self) -> Result<Session> {
        Session::do_open(self.agent, self.config).await
    }
}
