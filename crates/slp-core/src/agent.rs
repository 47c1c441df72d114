//! Directory agent boundary
//!
//! The client never speaks the wire protocol itself. Everything below the
//! session surface (transport, multicast convergence, DA election, caching)
//! belongs to an implementation of [`DirectoryAgent`].

use async_trait::async_trait;
use std::net::IpAddr;

use crate::{Continuation, Delivery, ServiceEntry, Status};

/// Opaque handle issued by a directory agent on open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

impl std::fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receiver for streamed results
///
/// In asynchronous mode an agent may call the sink from another thread, so
/// it must be `Send`.
pub type Sink<'a, T> = dyn FnMut(Delivery<T>) -> Continuation + Send + 'a;

/// Collaborator that executes SLP requests
///
/// Failures are reported as raw [`Status`] codes; the session maps them into
/// the error taxonomy. Registration reports are folded into the returned
/// status.
#[async_trait]
pub trait DirectoryAgent: Send + Sync {
    /// Open a handle for `language_tag` (empty = host default)
    async fn open(&self, language_tag: &str, asynchronous: bool) -> Result<NativeHandle, Status>;

    /// Release a handle. Must tolerate handles it no longer knows.
    fn close(&self, handle: NativeHandle);

    /// Register (or refresh, when `fresh` is false) a service URL
    async fn register(
        &self,
        handle: NativeHandle,
        url: &str,
        lifetime: u16,
        attributes: &str,
        fresh: bool,
    ) -> Result<(), Status>;

    /// Remove every scope and locale instance of a service URL
    async fn deregister(&self, handle: NativeHandle, url: &str) -> Result<(), Status>;

    /// Remove the comma-separated attribute ids from a registration
    async fn delete_attributes(
        &self,
        handle: NativeHandle,
        url: &str,
        attribute_ids: &str,
    ) -> Result<(), Status>;

    /// Scopes available to this handle, most desirable first
    async fn find_scopes(&self, handle: NativeHandle) -> Result<Vec<String>, Status>;

    /// Stream service URLs of `service_type` matching `filter`
    async fn find_services(
        &self,
        handle: NativeHandle,
        service_type: &str,
        scope: &str,
        filter: &str,
        sink: &mut Sink<'_, ServiceEntry>,
    ) -> Result<(), Status>;

    /// Stream service type names under `naming_authority`
    async fn find_service_types(
        &self,
        handle: NativeHandle,
        naming_authority: &str,
        scope: &str,
        sink: &mut Sink<'_, String>,
    ) -> Result<(), Status>;

    /// Stream encoded attribute lists for a service URL or service type
    async fn find_attributes(
        &self,
        handle: NativeHandle,
        url: &str,
        scope: &str,
        attribute_ids: &str,
        sink: &mut Sink<'_, String>,
    ) -> Result<(), Status>;

    /// Restrict multicast to a comma-separated interface list
    async fn associate_interfaces(
        &self,
        _handle: NativeHandle,
        _interfaces: &str,
    ) -> Result<(), Status> {
        Err(Status::NOT_IMPLEMENTED)
    }

    /// Send requests by unicast to a single agent address
    async fn associate_ip(&self, _handle: NativeHandle, _addr: IpAddr) -> Result<(), Status> {
        Err(Status::NOT_IMPLEMENTED)
    }
}
