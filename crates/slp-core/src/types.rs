//! Request and result values

use serde::{Deserialize, Serialize};

use crate::{Attributes, Result, SlpError, LIFETIME_DEFAULT};

/// A service URL found by a service query, with its remaining lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub url: String,
    /// Seconds left before the advertisement expires
    pub lifetime: u16,
}

impl ServiceEntry {
    pub fn new(url: impl Into<String>, lifetime: u16) -> Self {
        Self {
            url: url.into(),
            lifetime,
        }
    }
}

/// A service advertisement to register
///
/// Registrations are not cached by the client; the directory agent is
/// authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    pub url: String,
    /// Seconds the advertisement stays valid without refresh
    pub lifetime: u16,
    pub attributes: Attributes,
    /// `false` refreshes an existing registration instead of replacing it
    pub fresh: bool,
}

impl ServiceRegistration {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            lifetime: LIFETIME_DEFAULT,
            attributes: Attributes::new(),
            fresh: true,
        }
    }

    pub fn lifetime(mut self, seconds: u16) -> Self {
        self.lifetime = seconds;
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// Reject registrations no agent could accept
    ///
    /// A zero lifetime is what `refresh_interval()` reports when no agent
    /// advertises a minimum; it is never a usable lifetime.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(SlpError::parameter("register", "service URL is empty"));
        }
        if self.lifetime == 0 {
            return Err(SlpError::parameter("register", "lifetime must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, LIFETIME_MAXIMUM};

    #[test]
    fn test_registration_defaults() {
        let reg = ServiceRegistration::new("service:test://host");
        assert_eq!(reg.lifetime, LIFETIME_DEFAULT);
        assert!(reg.fresh);
        assert!(reg.attributes.is_empty());
        assert!(reg.validate().is_ok());
    }

    #[test]
    fn test_registration_validation() {
        let err = ServiceRegistration::new("").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterBad);

        let err = ServiceRegistration::new("service:test://host")
            .lifetime(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterBad);

        assert!(ServiceRegistration::new("service:test://host")
            .lifetime(LIFETIME_MAXIMUM)
            .validate()
            .is_ok());
    }
}
