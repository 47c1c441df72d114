//! SLP Core
//!
//! Core types and protocol primitives for the Service Location Protocol
//! (RFC 2608) client.
//!
//! This crate provides:
//! - Reserved-character escaping for attribute values and tags ([`escape`])
//! - Service URL parsing ([`ServiceUrl`])
//! - The error taxonomy and collaborator status codes ([`SlpError`], [`Status`])
//! - Attribute lists and their wire encoding ([`Attributes`])
//! - The enumeration adapter shared by every discovery query ([`Enumeration`])
//! - The directory-agent boundary ([`DirectoryAgent`])
//! - The process-wide property store ([`properties`])

pub mod agent;
pub mod attributes;
pub mod enumeration;
pub mod error;
pub mod escape;
pub mod properties;
pub mod types;
pub mod url;

pub use agent::{DirectoryAgent, NativeHandle, Sink};
pub use attributes::Attributes;
pub use enumeration::{Continuation, Delivery, Enumeration, HandlerResult};
pub use error::{ErrorKind, Result, SlpError, Status};
pub use escape::{escape, unescape};
pub use properties::{get_property, refresh_interval, set_property};
pub use types::{ServiceEntry, ServiceRegistration};
pub use url::ServiceUrl;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default registration lifetime in seconds (three hours)
pub const LIFETIME_DEFAULT: u16 = 10800;

/// Largest lifetime a registration may carry
pub const LIFETIME_MAXIMUM: u16 = 65535;

/// Scope every agent serves when nothing else is configured
pub const DEFAULT_SCOPE: &str = "DEFAULT";

/// Naming authority wildcard for service-type queries
pub const ALL_AUTHORITIES: &str = "*";

/// Prefix every service URL and service type carries
pub const SERVICE_PREFIX: &str = "service:";
