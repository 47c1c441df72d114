//! In-memory directory agent
//!
//! Holds registrations in process memory and answers queries the way a
//! single directory agent serving a fixed set of scopes would. Faults can be
//! injected per operation to exercise error paths.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use slp_core::agent::{DirectoryAgent, NativeHandle, Sink};
use slp_core::url::{abstract_type, naming_authority};
use slp_core::{
    properties, Attributes, Continuation, Delivery, ServiceEntry, ServiceUrl, Status,
    ALL_AUTHORITIES, DEFAULT_SCOPE, LIFETIME_DEFAULT, SERVICE_PREFIX,
};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::filter::{wildcard_match, Filter};

/// Operations that faults can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Register,
    Deregister,
    DeleteAttributes,
    FindScopes,
    FindServices,
    FindServiceTypes,
    FindAttributes,
    AssociateInterfaces,
    AssociateIp,
}

/// Configuration for [`MemoryAgent`]
#[derive(Debug, Clone)]
pub struct MemoryAgentConfig {
    /// Scopes served, most desirable first
    pub scopes: Vec<String>,
    /// Accepted language tags; empty accepts any
    pub languages: Vec<String>,
    /// min-refresh-interval advertised to the process on open
    pub min_refresh_interval: u32,
    /// Stop delivering as soon as a sink answers `Stop`
    pub honor_stop: bool,
}

impl Default for MemoryAgentConfig {
    fn default() -> Self {
        Self {
            scopes: vec![DEFAULT_SCOPE.to_string()],
            languages: Vec::new(),
            min_refresh_interval: 0,
            honor_stop: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Registration {
    url: String,
    service_type: String,
    language: String,
    scopes: Vec<String>,
    attributes: Attributes,
    lifetime: u16,
    registered_at: Instant,
}

impl Registration {
    fn remaining(&self, now: Instant) -> u16 {
        let elapsed = now.saturating_duration_since(self.registered_at).as_secs();
        u64::from(self.lifetime).saturating_sub(elapsed) as u16
    }

    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.registered_at) >= Duration::from_secs(self.lifetime.into())
    }

    fn in_scopes(&self, scopes: &[String]) -> bool {
        self.scopes
            .iter()
            .any(|s| scopes.iter().any(|q| q.eq_ignore_ascii_case(s)))
    }

    fn in_language(&self, language: &str) -> bool {
        language.is_empty() || self.language.is_empty() || self.language.eq_ignore_ascii_case(language)
    }

    fn has_type(&self, service_type: &str) -> bool {
        self.service_type.eq_ignore_ascii_case(service_type)
            || abstract_type(&self.service_type).eq_ignore_ascii_case(service_type)
    }
}

#[derive(Debug, Clone, Default)]
struct HandleState {
    language: String,
    asynchronous: bool,
    interfaces: Option<String>,
    unicast: Option<IpAddr>,
}

#[derive(Debug, Default)]
struct Faults {
    next: HashMap<Operation, Status>,
    mid_stream: Option<(usize, Status)>,
}

struct MemoryAgentInner {
    config: MemoryAgentConfig,
    registrations: RwLock<Vec<Registration>>,
    handles: Mutex<HashMap<u64, HandleState>>,
    next_handle: AtomicU64,
    closes: AtomicUsize,
    faults: Mutex<Faults>,
}

/// Directory agent backed by process memory
///
/// Clones share the same registry.
#[derive(Clone)]
pub struct MemoryAgent {
    inner: Arc<MemoryAgentInner>,
}

impl MemoryAgent {
    pub fn new() -> Self {
        Self::with_config(MemoryAgentConfig::default())
    }

    pub fn with_config(config: MemoryAgentConfig) -> Self {
        Self {
            inner: Arc::new(MemoryAgentInner {
                config,
                registrations: RwLock::new(Vec::new()),
                handles: Mutex::new(HashMap::new()),
                next_handle: AtomicU64::new(1),
                closes: AtomicUsize::new(0),
                faults: Mutex::new(Faults::default()),
            }),
        }
    }

    /// Fail the next call of `operation` with `status`
    pub fn fail_next(&self, operation: Operation, status: Status) {
        self.inner.faults.lock().next.insert(operation, status);
    }

    /// Fail the next enumeration after `items` deliveries
    pub fn fail_mid_stream(&self, items: usize, status: Status) {
        self.inner.faults.lock().mid_stream = Some((items, status));
    }

    /// Number of handles currently open
    pub fn open_handles(&self) -> usize {
        self.inner.handles.lock().len()
    }

    /// Number of close calls received, including repeated ones
    pub fn close_calls(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    /// Number of live registrations
    pub fn registration_count(&self) -> usize {
        let now = Instant::now();
        self.inner
            .registrations
            .read()
            .iter()
            .filter(|r| !r.expired(now))
            .count()
    }

    /// Register `url` directly, bypassing any session
    pub async fn seed(&self, url: &str, attributes: &Attributes) -> Result<(), Status> {
        let handle = self.open("", false).await?;
        let result = self
            .register(handle, url, LIFETIME_DEFAULT, &attributes.encode(), true)
            .await;
        self.close(handle);
        result
    }

    /// Whether `handle` was opened in asynchronous mode
    pub fn is_asynchronous(&self, handle: NativeHandle) -> Option<bool> {
        self.inner.handles.lock().get(&handle.0).map(|h| h.asynchronous)
    }

    /// Interface list associated with `handle`
    pub fn interfaces(&self, handle: NativeHandle) -> Option<String> {
        self.inner
            .handles
            .lock()
            .get(&handle.0)
            .and_then(|h| h.interfaces.clone())
    }

    /// Unicast address associated with `handle`
    pub fn unicast_address(&self, handle: NativeHandle) -> Option<IpAddr> {
        self.inner.handles.lock().get(&handle.0).and_then(|h| h.unicast)
    }

    fn take_fault(&self, operation: Operation) -> Result<(), Status> {
        match self.inner.faults.lock().next.remove(&operation) {
            Some(status) => {
                debug!("Injected {:?} failure: {}", operation, status);
                Err(status)
            }
            None => Ok(()),
        }
    }

    fn handle_state(&self, handle: NativeHandle) -> Result<HandleState, Status> {
        self.inner
            .handles
            .lock()
            .get(&handle.0)
            .cloned()
            .ok_or(Status::PARAMETER_BAD)
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        self.inner.registrations.write().retain(|r| {
            let keep = !r.expired(now);
            if !keep {
                debug!("Registration expired: {}", r.url);
            }
            keep
        });
    }

    /// Requested scopes, or every served scope when `scope` is empty
    fn resolve_scopes(&self, scope: &str) -> Result<Vec<String>, Status> {
        if scope.trim().is_empty() {
            return Ok(self.inner.config.scopes.clone());
        }
        let served: Vec<String> = scope
            .split(',')
            .map(str::trim)
            .filter(|s| {
                self.inner
                    .config
                    .scopes
                    .iter()
                    .any(|served| served.eq_ignore_ascii_case(s))
            })
            .map(str::to_string)
            .collect();
        if served.is_empty() {
            Err(Status::SCOPE_NOT_SUPPORTED)
        } else {
            Ok(served)
        }
    }

    /// Push `items` into `sink`, then the last-call marker
    async fn deliver<T: Send>(
        &self,
        items: Vec<T>,
        asynchronous: bool,
        sink: &mut Sink<'_, T>,
    ) -> Result<(), Status> {
        let mid_stream = self.inner.faults.lock().mid_stream.take();

        for (index, item) in items.into_iter().enumerate() {
            if let Some((after, status)) = mid_stream {
                if index == after {
                    sink(Delivery::Failed(status));
                    return Ok(());
                }
            }
            if asynchronous {
                // Lets a multi-threaded runtime resume delivery on another worker
                tokio::task::yield_now().await;
            }
            if sink(Delivery::Item(item)) == Continuation::Stop && self.inner.config.honor_stop {
                return Ok(());
            }
        }

        if let Some((_, status)) = mid_stream {
            sink(Delivery::Failed(status));
            return Ok(());
        }
        sink(Delivery::LastCall);
        Ok(())
    }
}

impl Default for MemoryAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn valid_language_tag(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let primary = parts.next().unwrap_or_default();
    let primary_ok =
        (1..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    primary_ok
        && parts.all(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn normalize_type(service_type: &str) -> String {
    if service_type.starts_with(SERVICE_PREFIX) {
        service_type.to_string()
    } else {
        format!("{}{}", SERVICE_PREFIX, service_type)
    }
}

fn attribute_ids(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect()
}

fn select_attributes(attrs: &Attributes, ids: &[&str]) -> Attributes {
    if ids.is_empty() {
        return attrs.clone();
    }
    attrs
        .iter()
        .filter(|(name, _)| ids.iter().any(|id| wildcard_match(id, name)))
        .collect()
}

#[async_trait]
impl DirectoryAgent for MemoryAgent {
    async fn open(&self, language_tag: &str, asynchronous: bool) -> Result<NativeHandle, Status> {
        self.take_fault(Operation::Open)?;

        if !language_tag.is_empty() {
            if !valid_language_tag(language_tag) {
                return Err(Status::PARSE_ERROR);
            }
            let languages = &self.inner.config.languages;
            let supported = languages.is_empty()
                || languages.iter().any(|l| {
                    l.eq_ignore_ascii_case(language_tag)
                        || language_tag
                            .split('-')
                            .next()
                            .map_or(false, |primary| l.eq_ignore_ascii_case(primary))
                });
            if !supported {
                return Err(Status::LANGUAGE_NOT_SUPPORTED);
            }
        }

        let id = self.inner.next_handle.fetch_add(1, Ordering::SeqCst);
        self.inner.handles.lock().insert(
            id,
            HandleState {
                language: language_tag.to_string(),
                asynchronous,
                ..HandleState::default()
            },
        );

        if self.inner.config.min_refresh_interval > 0 {
            properties::note_min_refresh_interval(self.inner.config.min_refresh_interval);
        }

        debug!("Opened handle #{} (lang={:?}, async={})", id, language_tag, asynchronous);
        Ok(NativeHandle(id))
    }

    fn close(&self, handle: NativeHandle) {
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
        if self.inner.handles.lock().remove(&handle.0).is_none() {
            warn!("Close of unknown handle {}", handle);
        }
    }

    async fn register(
        &self,
        handle: NativeHandle,
        url: &str,
        lifetime: u16,
        attributes: &str,
        fresh: bool,
    ) -> Result<(), Status> {
        let state = self.handle_state(handle)?;
        self.take_fault(Operation::Register)?;

        let parsed = ServiceUrl::parse(url).map_err(|_| Status::INVALID_REGISTRATION)?;
        if lifetime == 0 {
            return Err(Status::INVALID_REGISTRATION);
        }
        let attributes = Attributes::decode(attributes).ok_or(Status::PARSE_ERROR)?;

        self.purge_expired();
        let mut registrations = self.inner.registrations.write();
        let existing = registrations.iter_mut().find(|r| r.url == url);

        match (existing, fresh) {
            (Some(reg), true) => {
                reg.attributes = attributes;
                reg.lifetime = lifetime;
                reg.language = state.language;
                reg.registered_at = Instant::now();
                debug!("Re-registered {}", url);
            }
            (Some(reg), false) => {
                reg.attributes.extend(
                    attributes
                        .iter()
                        .map(|(n, v)| (n.to_string(), v.to_string())),
                );
                reg.lifetime = lifetime;
                reg.registered_at = Instant::now();
                debug!("Refreshed {}", url);
            }
            (None, false) => return Err(Status::INVALID_UPDATE),
            (None, true) => {
                registrations.push(Registration {
                    url: url.to_string(),
                    service_type: parsed.service_type,
                    language: state.language,
                    scopes: self.inner.config.scopes.clone(),
                    attributes,
                    lifetime,
                    registered_at: Instant::now(),
                });
                info!("Registered {} (lifetime {}s)", url, lifetime);
            }
        }
        Ok(())
    }

    async fn deregister(&self, handle: NativeHandle, url: &str) -> Result<(), Status> {
        self.handle_state(handle)?;
        self.take_fault(Operation::Deregister)?;
        self.purge_expired();

        let mut registrations = self.inner.registrations.write();
        let before = registrations.len();
        registrations.retain(|r| r.url != url);
        if registrations.len() == before {
            return Err(Status::INVALID_REGISTRATION);
        }
        info!("Deregistered {}", url);
        Ok(())
    }

    async fn delete_attributes(
        &self,
        handle: NativeHandle,
        url: &str,
        attribute_ids_list: &str,
    ) -> Result<(), Status> {
        self.handle_state(handle)?;
        self.take_fault(Operation::DeleteAttributes)?;
        self.purge_expired();

        let ids = attribute_ids(attribute_ids_list);
        if ids.is_empty() {
            return Err(Status::PARAMETER_BAD);
        }

        let mut registrations = self.inner.registrations.write();
        let reg = registrations
            .iter_mut()
            .find(|r| r.url == url)
            .ok_or(Status::INVALID_REGISTRATION)?;
        let doomed: Vec<String> = reg
            .attributes
            .iter()
            .filter(|(name, _)| ids.iter().any(|id| wildcard_match(id, name)))
            .map(|(name, _)| name.to_string())
            .collect();
        for name in doomed {
            reg.attributes.remove(&name);
        }
        Ok(())
    }

    async fn find_scopes(&self, handle: NativeHandle) -> Result<Vec<String>, Status> {
        self.handle_state(handle)?;
        self.take_fault(Operation::FindScopes)?;
        Ok(self.inner.config.scopes.clone())
    }

    async fn find_services(
        &self,
        handle: NativeHandle,
        service_type: &str,
        scope: &str,
        filter: &str,
        sink: &mut Sink<'_, ServiceEntry>,
    ) -> Result<(), Status> {
        let state = self.handle_state(handle)?;
        self.take_fault(Operation::FindServices)?;
        if service_type.is_empty() {
            return Err(Status::PARAMETER_BAD);
        }
        let scopes = self.resolve_scopes(scope)?;
        let filter = if filter.trim().is_empty() {
            None
        } else {
            Some(Filter::parse(filter).ok_or(Status::PARSE_ERROR)?)
        };
        let service_type = normalize_type(service_type);

        self.purge_expired();
        let now = Instant::now();
        let found: Vec<ServiceEntry> = self
            .inner
            .registrations
            .read()
            .iter()
            .filter(|r| r.has_type(&service_type))
            .filter(|r| r.in_scopes(&scopes) && r.in_language(&state.language))
            .filter(|r| filter.as_ref().map_or(true, |f| f.matches(&r.attributes)))
            .map(|r| ServiceEntry::new(r.url.clone(), r.remaining(now)))
            .collect();

        debug!("find_services {} -> {} result(s)", service_type, found.len());
        self.deliver(found, state.asynchronous, sink).await
    }

    async fn find_service_types(
        &self,
        handle: NativeHandle,
        authority: &str,
        scope: &str,
        sink: &mut Sink<'_, String>,
    ) -> Result<(), Status> {
        let state = self.handle_state(handle)?;
        self.take_fault(Operation::FindServiceTypes)?;
        let scopes = self.resolve_scopes(scope)?;

        self.purge_expired();
        let mut types: Vec<String> = Vec::new();
        for reg in self.inner.registrations.read().iter() {
            if !reg.in_scopes(&scopes) {
                continue;
            }
            let matches_authority = authority == ALL_AUTHORITIES
                || naming_authority(&reg.service_type).eq_ignore_ascii_case(authority);
            if matches_authority && !types.iter().any(|t| *t == reg.service_type) {
                types.push(reg.service_type.clone());
            }
        }

        self.deliver(types, state.asynchronous, sink).await
    }

    async fn find_attributes(
        &self,
        handle: NativeHandle,
        url: &str,
        scope: &str,
        attribute_ids_list: &str,
        sink: &mut Sink<'_, String>,
    ) -> Result<(), Status> {
        let state = self.handle_state(handle)?;
        self.take_fault(Operation::FindAttributes)?;
        if url.is_empty() {
            return Err(Status::PARAMETER_BAD);
        }
        let scopes = self.resolve_scopes(scope)?;
        let ids = attribute_ids(attribute_ids_list);
        let by_type = !url.contains("://");
        let service_type = normalize_type(url);

        self.purge_expired();
        let lists: Vec<String> = self
            .inner
            .registrations
            .read()
            .iter()
            .filter(|r| {
                if by_type {
                    r.has_type(&service_type)
                } else {
                    r.url == url
                }
            })
            .filter(|r| r.in_scopes(&scopes))
            .map(|r| select_attributes(&r.attributes, &ids))
            .filter(|attrs| !attrs.is_empty())
            .map(|attrs| attrs.encode())
            .collect();

        self.deliver(lists, state.asynchronous, sink).await
    }

    async fn associate_interfaces(
        &self,
        handle: NativeHandle,
        interfaces: &str,
    ) -> Result<(), Status> {
        self.handle_state(handle)?;
        self.take_fault(Operation::AssociateInterfaces)?;
        if interfaces.trim().is_empty() {
            return Err(Status::PARAMETER_BAD);
        }
        let mut handles = self.inner.handles.lock();
        let state = handles.get_mut(&handle.0).ok_or(Status::PARAMETER_BAD)?;
        state.interfaces = Some(interfaces.to_string());
        Ok(())
    }

    async fn associate_ip(&self, handle: NativeHandle, addr: IpAddr) -> Result<(), Status> {
        self.handle_state(handle)?;
        self.take_fault(Operation::AssociateIp)?;
        let mut handles = self.inner.handles.lock();
        let state = handles.get_mut(&handle.0).ok_or(Status::PARAMETER_BAD)?;
        state.unicast = Some(addr);
        Ok(())
    }
}
