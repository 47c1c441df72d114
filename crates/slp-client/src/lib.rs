//! SLP Client Library
//!
//! High-level async client for the Service Location Protocol.
//!
//! # Example
//!
//! ```ignore
//! use slp_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = Session::open(agent, "en", false).await?;
//!
//!     session
//!         .register(&ServiceRegistration::new("service:printer://host:631").lifetime(600))
//!         .await?;
//!
//!     for entry in session.find_services("service:printer", "", "").await? {
//!         println!("{} ({}s)", entry.url, entry.lifetime);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod session;

pub use builder::{SessionBuilder, SessionConfig};
pub use session::Session;
pub use slp_core::{get_property, refresh_interval, set_property, ErrorKind, Result, SlpError};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::{SessionBuilder, SessionConfig};
    pub use crate::session::Session;
    pub use slp_core::{
        Attributes, Continuation, DirectoryAgent, ErrorKind, HandlerResult, Result,
        ServiceEntry, ServiceRegistration, ServiceUrl, SlpError,
    };
}
