//! Custom property sets and their wire encodings
//!
//! Properties travel in two shapes:
//! - the CSV form `name=value:name=value`
//! - the RPC form, positional `propName0`/`propValue0`, `propName1`/`propValue1`, ...
//!
//! Decoding is best-effort: a segment without `=` becomes a property with an
//! empty value instead of an error.

use std::fmt;

use tracing::warn;

use crate::utils::validation::validate_property_name;

/// Ordered name/value pairs; encoding assigns indices by insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    entries: Vec<(String, String)>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name=value:name=value`; `None` or empty input yields an empty set
    pub fn decode(raw: Option<&str>) -> Self {
        let mut set = Self::new();
        let Some(raw) = raw else {
            return set;
        };

        for segment in raw.split(':') {
            if segment.trim().is_empty() {
                continue;
            }
            let (name, value) = segment.split_once('=').unwrap_or((segment, ""));
            let name = name.trim();
            if name.is_empty() {
                warn!(segment = %segment, "Ignoring property without a name");
                continue;
            }
            if !validate_property_name(name) {
                warn!(property = %name, "Property name contains unexpected characters");
            }
            set.insert(name, value);
        }

        set
    }

    /// Insert or replace a property; a replaced property keeps its position
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
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

    /// RPC parameters `propName{i}`/`propValue{i}` in insertion order
    pub fn encode(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .enumerate()
            .flat_map(|(i, (name, value))| {
                [
                    (format!("propName{}", i), name.clone()),
                    (format!("propValue{}", i), value.clone()),
                ]
            })
            .collect()
    }

    /// CSV form `name=value:name=value`
    pub fn to_property_string(&self) -> String {
        self.entries
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_property_string())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}
