//! SLP session implementation

use futures::future::BoxFuture;
use parking_lot::Mutex;
use slp_core::agent::{DirectoryAgent, NativeHandle};
use slp_core::enumeration::continue_all;
use slp_core::error::StatusExt;
use slp_core::{
    Enumeration, HandlerResult, Result, ServiceEntry, ServiceRegistration, SlpError,
    DEFAULT_SCOPE,
};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::builder::{SessionBuilder, SessionConfig};

/// Clears the busy flag when an operation ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One open SLP handle
///
/// The handle is released exactly once: by [`Session::close`], or on drop if
/// the session is still open. A session runs one operation at a time; a
/// second concurrent operation fails with `HandleInUse`.
pub struct Session {
    agent: Arc<dyn DirectoryAgent>,
    config: SessionConfig,
    handle: Mutex<Option<NativeHandle>>,
    busy: AtomicBool,
}

impl Session {
    /// Create a builder
    pub fn builder(agent: Arc<dyn DirectoryAgent>) -> SessionBuilder {
        SessionBuilder::new(agent)
    }

    /// Open a session (convenience method)
    pub async fn open(
        agent: Arc<dyn DirectoryAgent>,
        language_tag: &str,
        asynchronous: bool,
    ) -> Result<Self> {
        SessionBuilder::new(agent)
            .language(language_tag)
            .asynchronous(asynchronous)
            .open()
            .await
    }

    /// Internal open
    pub(crate) async fn do_open(agent: Arc<dyn DirectoryAgent>, config: SessionConfig) -> Result<Self> {
        let handle = agent
            .open(&config.language_tag, config.asynchronous)
            .await
            .or_slp("open")
            .map_err(|e| {
                warn!("Failed to open SLP session: {}", e);
                e
            })?;

        if let Some(addr) = config.host {
            if let Err(e) = agent.associate_ip(handle, addr).await.or_slp("open") {
                warn!("Failed to associate session {} with {}: {}", handle, addr, e);
                agent.close(handle);
                return Err(e);
            }
        }

        info!(
            "Opened SLP session {} (lang={:?}, async={}, host={:?})",
            handle, config.language_tag, config.asynchronous, config.host
        );

        Ok(Self {
            agent,
            config,
            handle: Mutex::new(Some(handle)),
            busy: AtomicBool::new(false),
        })
    }

    /// Open a session, run `f` with it and close it on every exit path
    pub async fn scoped<F, R>(
        agent: Arc<dyn DirectoryAgent>,
        language_tag: &str,
        asynchronous: bool,
        f: F,
    ) -> Result<R>
    where
        F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, Result<R>>,
    {
        let session = Session::open(agent, language_tag, asynchronous).await?;
        let result = f(&session).await;
        session.close();
        result
    }

    /// Release the handle. Repeated calls are no-ops.
    pub fn close(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            self.agent.close(handle);
            info!("Closed SLP session {}", handle);
        }
    }

    /// Check if the session is still open
    pub fn is_open(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Handle issued by the directory agent, while open
    pub fn native_handle(&self) -> Option<NativeHandle> {
        *self.handle.lock()
    }

    /// Language tag the session was opened with; empty means host default
    pub fn language_tag(&self) -> &str {
        &self.config.language_tag
    }

    pub fn is_asynchronous(&self) -> bool {
        self.config.asynchronous
    }

    /// Claim the handle for one operation
    fn begin(&self, operation: &'static str) -> Result<(NativeHandle, BusyGuard<'_>)> {
        let handle = self
            .native_handle()
            .ok_or_else(|| SlpError::closed(operation))?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("{}: session {} already in use", operation, handle);
            return Err(SlpError::in_use(operation));
        }
        Ok((handle, BusyGuard(&self.busy)))
    }

    /// Scopes available to this session, most desirable first
    ///
    /// Never empty: `DEFAULT` stands in when the agent names none.
    pub async fn find_scopes(&self) -> Result<Vec<String>> {
        let (handle, _busy) = self.begin("find_scopes")?;

        let mut scopes: Vec<String> = self
            .agent
            .find_scopes(handle)
            .await
            .or_slp("find_scopes")?
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if scopes.is_empty() {
            scopes.push(DEFAULT_SCOPE.to_string());
        }
        debug!("find_scopes -> {:?}", scopes);
        Ok(scopes)
    }

    /// Register a service, returning its URL
    ///
    /// Registering the same URL again replaces the advertisement.
    pub async fn register(&self, registration: &ServiceRegistration) -> Result<String> {
        let (handle, _busy) = self.begin("register")?;
        registration.validate()?;

        let attributes = registration.attributes.encode();
        self.agent
            .register(
                handle,
                &registration.url,
                registration.lifetime,
                &attributes,
                registration.fresh,
            )
            .await
            .or_slp("register")
            .map_err(|e| {
                warn!("Registration of {} failed: {}", registration.url, e);
                e
            })?;

        debug!(
            "Registered {} (lifetime {}s, fresh={})",
            registration.url, registration.lifetime, registration.fresh
        );
        Ok(registration.url.clone())
    }

    /// Remove every scope and locale instance of a service, returning its URL
    ///
    /// Unknown URLs are an error.
    pub async fn deregister(&self, url: &str) -> Result<String> {
        let (handle, _busy) = self.begin("deregister")?;
        if url.is_empty() {
            return Err(SlpError::parameter("deregister", "service URL is empty"));
        }

        self.agent
            .deregister(handle, url)
            .await
            .or_slp("deregister")?;

        debug!("Deregistered {}", url);
        Ok(url.to_string())
    }

    /// Delete the comma-separated attribute ids from a registration
    pub async fn delete_service_attributes(&self, url: &str, attribute_ids: &str) -> Result<String> {
        let (handle, _busy) = self.begin("delete_service_attributes")?;
        if url.is_empty() {
            return Err(SlpError::parameter(
                "delete_service_attributes",
                "service URL is empty",
            ));
        }

        self.agent
            .delete_attributes(handle, url, attribute_ids)
            .await
            .or_slp("delete_service_attributes")?;

        Ok(attribute_ids.to_string())
    }

    /// Find every service of `service_type`
    ///
    /// An empty `scope` searches the locally configured scopes; an empty
    /// `filter` matches everything.
    pub async fn find_services(
        &self,
        service_type: &str,
        scope: &str,
        filter: &str,
    ) -> Result<Vec<ServiceEntry>> {
        self.find_services_with(service_type, scope, filter, continue_all)
            .await
    }

    /// Find services, passing each one to `handler` as it arrives
    pub async fn find_services_with<H>(
        &self,
        service_type: &str,
        scope: &str,
        filter: &str,
        handler: H,
    ) -> Result<Vec<ServiceEntry>>
    where
        H: FnMut(&ServiceEntry) -> HandlerResult + Send,
    {
        const OP: &str = "find_services";
        let (handle, _busy) = self.begin(OP)?;
        if service_type.is_empty() {
            return Err(SlpError::parameter(OP, "service type is empty"));
        }

        let mut enumeration = Enumeration::new(OP, handler);
        let issued = self
            .agent
            .find_services(handle, service_type, scope, filter, &mut |delivery| {
                enumeration.deliver(delivery)
            })
            .await;

        let services = enumeration.finish(issued)?;
        debug!("find_services {} -> {} result(s)", service_type, services.len());
        Ok(services)
    }

    /// Find service types under `naming_authority` (`*` for all, empty for IANA)
    pub async fn find_service_types(&self, naming_authority: &str, scope: &str) -> Result<Vec<String>> {
        self.find_service_types_with(naming_authority, scope, continue_all)
            .await
    }

    /// Find service types, passing each one to `handler` as it arrives
    pub async fn find_service_types_with<H>(
        &self,
        naming_authority: &str,
        scope: &str,
        handler: H,
    ) -> Result<Vec<String>>
    where
        H: FnMut(&String) -> HandlerResult + Send,
    {
        const OP: &str = "find_service_types";
        let (handle, _busy) = self.begin(OP)?;

        let mut enumeration = Enumeration::new(OP, handler);
        let issued = self
            .agent
            .find_service_types(handle, naming_authority, scope, &mut |delivery| {
                enumeration.deliver(delivery)
            })
            .await;

        enumeration.finish(issued)
    }

    /// Find attribute lists for a service URL or service type
    ///
    /// Empty `attribute_ids` selects every attribute.
    pub async fn find_service_attributes(
        &self,
        url: &str,
        attribute_ids: &str,
        scope: &str,
    ) -> Result<Vec<String>> {
        self.find_service_attributes_with(url, attribute_ids, scope, continue_all)
            .await
    }

    /// Find attribute lists, passing each one to `handler` as it arrives
    pub async fn find_service_attributes_with<H>(
        &self,
        url: &str,
        attribute_ids: &str,
        scope: &str,
        handler: H,
    ) -> Result<Vec<String>>
    where
        H: FnMut(&String) -> HandlerResult + Send,
    {
        const OP: &str = "find_service_attributes";
        let (handle, _busy) = self.begin(OP)?;
        if url.is_empty() {
            return Err(SlpError::parameter(OP, "service URL is empty"));
        }

        let mut enumeration = Enumeration::new(OP, handler);
        let issued = self
            .agent
            .find_attributes(handle, url, scope, attribute_ids, &mut |delivery| {
                enumeration.deliver(delivery)
            })
            .await;

        enumeration.finish(issued)
    }

    /// Restrict multicast to a comma-separated interface list
    pub async fn associate_interfaces(&self, interfaces: &str) -> Result<()> {
        let (handle, _busy) = self.begin("associate_interfaces")?;
        self.agent
            .associate_interfaces(handle, interfaces)
            .await
            .or_slp("associate_interfaces")
    }

    /// Send requests by unicast to the agent at `addr`
    pub async fn associate_ip(&self, addr: IpAddr) -> Result<()> {
        let (handle, _busy) = self.begin("associate_ip")?;
        self.agent
            .associate_ip(handle, addr)
            .await
            .or_slp("associate_ip")?;
        debug!("Session {} associated with {}", handle, addr);
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("language_tag", &self.config.language_tag)
            .field("asynchronous", &self.config.asynchronous)
            .field("handle", &self.native_handle())
            .finish()
    }
}
