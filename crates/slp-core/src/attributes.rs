//! Attribute lists
//!
//! Registrations carry attributes as a comma-joined list of `(name=value)`
//! pairs. Names and values are written verbatim; callers escape reserved
//! characters with [`crate::escape`] beforehand when needed.

use serde::{Deserialize, Serialize};

/// Ordered attribute mapping
///
/// Iteration and encoding follow insertion order. Inserting an existing name
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Encode as `(name=value),(name=value)`; empty encodes to `""`
    pub fn encode(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("({}={})", name, value))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Decode an attribute list produced by [`Attributes::encode`]
    ///
    /// Bare keyword attributes (no parentheses) map to an empty value.
    /// Returns `None` when parentheses are unbalanced.
    pub fn decode(list: &str) -> Option<Self> {
        let mut attrs = Attributes::new();
        let mut rest = list.trim();

        while !rest.is_empty() {
            if let Some(body) = rest.strip_prefix('(') {
                let close = body.find(')')?;
                let pair = &body[..close];
                match pair.split_once('=') {
                    Some((name, value)) => attrs.insert(name.trim(), value.trim()),
                    None => attrs.insert(pair.trim(), ""),
                };
                rest = body[close + 1..].trim_start();
            } else {
                let end = rest.find(',').unwrap_or(rest.len());
                let keyword = rest[..end].trim();
                if keyword.contains(')') {
                    return None;
                }
                if !keyword.is_empty() {
                    attrs.insert(keyword, "");
                }
                rest = &rest[end..];
            }
            rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
        }

        Some(attrs)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Attributes {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl std::fmt::Display for Attributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}
