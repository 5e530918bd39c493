//! Host data models

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{GroupPath, PropertySet};
use crate::utils::validation::validate_hostname;
use crate::utils::{AppError, AppResult};

/// One row of a host import CSV
///
/// Empty cells are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRecord {
    /// 1-based line in the source file
    pub line: u64,
    pub hostname: Option<String>,
    pub collector_id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// `name=value:name=value`
    pub properties: Option<String>,
    /// `/path/one:/path/two`
    pub group_list: Option<String>,
    pub link: Option<String>,
}

impl ImportRecord {
    /// Require the host name and collector id
    pub fn validate(&self) -> AppResult<()> {
        let hostname = self.hostname.as_deref().unwrap_or_default();
        if hostname.is_empty() {
            return Err(AppError::Validation(format!(
                "Line {}: hostname is required",
                self.line
            )));
        }
        if !validate_hostname(hostname) {
            warn!(line = self.line, hostname, "Unusual host name, sending it as is");
        }
        if self.collector_id.as_deref().unwrap_or_default().is_empty() {
            return Err(AppError::Validation(format!(
                "Line {}: collector_id is required for host '{}'",
                self.line, hostname
            )));
        }
        Ok(())
    }

    /// Label used in summaries and logs
    pub fn label(&self) -> String {
        match &self.hostname {
            Some(hostname) => hostname.clone(),
            None => format!("<line {}>", self.line),
        }
    }

    /// Display name, defaulting to the host name
    pub fn effective_display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.hostname.as_deref())
            .unwrap_or_default()
    }

    /// Group paths from `group_list`, in input order
    pub fn group_paths(&self) -> AppResult<Vec<GroupPath>> {
        self.group_list
            .as_deref()
            .unwrap_or_default()
            .split(':')
            .filter(|token| !token.trim().is_empty())
            .map(GroupPath::parse)
            .collect()
    }

    pub fn property_set(&self) -> PropertySet {
        PropertySet::decode(self.properties.as_deref())
    }
}

/// A host as returned by the host listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRecord {
    pub id: i64,
    pub host_name: String,
    #[serde(default)]
    pub displayed_as: Option<String>,
    /// Collector id; the API reports it as a number
    #[serde(default)]
    pub agent_id: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
    /// Inherited and system properties, including `system.groups`
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl HostRecord {
    /// Collector id as a string, whatever JSON type carried it
    pub fn collector_id(&self) -> String {
        match &self.agent_id {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.displayed_as.as_deref().unwrap_or(&self.host_name)
    }

    /// Full paths of the groups the host belongs to (`system.groups`)
    pub fn group_paths(&self) -> Vec<String> {
        self.properties
            .get("system.groups")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A single property of a host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostProperty {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// One row of a host export CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub collector_id: String,
    pub hostname: String,
    pub display_name: String,
    /// Group paths joined by `:`
    pub group_list: String,
    pub description: String,
    /// `name=value:name=value`
    pub properties: String,
}

impl ExportRecord {
    /// `groups` are full paths without leading slash, as the listing reports them
    pub fn new(host: &HostRecord, groups: &[String], properties: &PropertySet) -> Self {
        Self {
            collector_id: host.collector_id(),
            hostname: host.host_name.clone(),
            display_name: host.display_name().to_string(),
            group_list: groups
                .iter()
                .map(|p| format!("/{}", p))
                .collect::<Vec<_>>()
                .join(":"),
            description: host.description.clone().unwrap_or_default(),
            properties: properties.to_property_string(),
        }
    }
}
