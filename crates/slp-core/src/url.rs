//! Service URL parsing
//!
//! Service URLs follow this format:
//! ```text
//! service:<srv-type>://<host>[:<port>][,<net-family>...][<url-part>]
//! service:printer:lpr://printer.example.com:515/queue1
//! service:test.openslp://192.168.100.1:3003
//! service:ntp://[fe80::1]:123
//! ```
//!
//! The port is the run of decimal digits after `:`. A `,`-led suffix after
//! the host or port (such as `,en,65535`) is ignored up to the next `/` or
//! `;`, matching what directory agents accept.

use serde::{Deserialize, Serialize};

use crate::{Result, SlpError, SERVICE_PREFIX};

/// A parsed service URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceUrl {
    /// Service type including the `service:` prefix
    pub service_type: String,
    /// Host name or address (IPv6 literals without brackets)
    pub host: String,
    /// Port, if one was given
    pub port: Option<u16>,
    /// Network family; empty for IP
    pub net_family: String,
    /// Everything after host and port, starting at `/` or `;`
    pub url_remainder: String,
}

impl ServiceUrl {
    /// Parse a service URL string
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(SlpError::parse("parse_service_url", "empty service URL"));
        }

        let (service_type, rest) = s.split_once("://").ok_or_else(|| {
            SlpError::parse(
                "parse_service_url",
                format!("missing '://' in service URL: {}", s),
            )
        })?;

        let concrete = service_type
            .strip_prefix(SERVICE_PREFIX)
            .ok_or_else(|| {
                SlpError::parse(
                    "parse_service_url",
                    format!("service URL must start with '{}': {}", SERVICE_PREFIX, s),
                )
            })?;
        if concrete.is_empty() || concrete.starts_with(':') {
            return Err(SlpError::parse(
                "parse_service_url",
                format!("empty service type: {}", s),
            ));
        }

        let (host, rest) = split_host(rest)
            .ok_or_else(|| SlpError::parse("parse_service_url", format!("bad host: {}", s)))?;
        if host.is_empty() {
            return Err(SlpError::parse(
                "parse_service_url",
                format!("empty host: {}", s),
            ));
        }

        let (port, rest) = match rest.strip_prefix(':') {
            Some(after) => {
                let end = after.find(['/', ';']).unwrap_or(after.len());
                (Some(parse_port(&after[..end], s)?), &after[end..])
            }
            None => (None, rest),
        };

        let remainder = match rest.find(['/', ';']) {
            Some(start) => &rest[start..],
            None => "",
        };

        Ok(Self {
            service_type: service_type.to_string(),
            host: host.to_string(),
            port,
            net_family: String::new(),
            url_remainder: remainder.to_string(),
        })
    }

    /// Abstract type, e.g. `service:printer` for `service:printer:lpr`
    pub fn abstract_type(&self) -> &str {
        abstract_type(&self.service_type)
    }

    /// Naming authority of the service type; empty for IANA types
    pub fn naming_authority(&self) -> &str {
        naming_authority(&self.service_type)
    }
}

/// Abstract part of a service type string
pub fn abstract_type(service_type: &str) -> &str {
    let body = service_type.strip_prefix(SERVICE_PREFIX).unwrap_or(service_type);
    match body.find(':') {
        Some(end) => &service_type[..service_type.len() - body.len() + end],
        None => service_type,
    }
}

/// Naming authority of a service type string; empty for IANA types
pub fn naming_authority(service_type: &str) -> &str {
    let abstract_part = abstract_type(service_type);
    let body = abstract_part
        .strip_prefix(SERVICE_PREFIX)
        .unwrap_or(abstract_part);
    match body.rfind('.') {
        Some(dot) => &body[dot + 1..],
        None => "",
    }
}

/// Split the host off the front of `rest`, returning (host, tail)
fn split_host(rest: &str) -> Option<(&str, &str)> {
    if let Some(v6) = rest.strip_prefix('[') {
        let close = v6.find(']')?;
        return Some((&v6[..close], &v6[close + 1..]));
    }
    let end = rest.find([':', ',', '/', ';']).unwrap_or(rest.len());
    Some((&rest[..end], &rest[end..]))
}

fn parse_port(segment: &str, url: &str) -> Result<u16> {
    let digits = segment
        .find(|c: char| !c.is_ascii_digit())
        .map_or(segment, |end| &segment[..end]);
    if digits.is_empty() {
        return Err(SlpError::parse(
            "parse_service_url",
            format!("missing port number: {}", url),
        ));
    }
    digits.parse::<u16>().map_err(|_| {
        SlpError::parse(
            "parse_service_url",
            format!("port out of range: {}", url),
        )
    })
}

impl std::fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://", self.service_type)?;
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            f.write_str(&self.host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        f.write_str(&self.url_remainder)
    }
}

impl std::str::FromStr for ServiceUrl {
    type Err = SlpError;

    fn from_str(s: &str) -> Result<Self> {
        ServiceUrl::parse(s)
    }
}

impl TryFrom<&str> for ServiceUrl {
    type Error = SlpError;

    fn try_from(s: &str) -> Result<Self> {
        ServiceUrl::parse(s)
    }
}

impl TryFrom<String> for ServiceUrl {
    type Error = SlpError;

    fn try_from(s: String) -> Result<Self> {
        ServiceUrl::parse(&s)
    }
}
