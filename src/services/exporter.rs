//! Bulk host export
//!
//! Lists every host under the root group, reads each host's own properties and
//! produces one [`ExportRecord`] per host. The output can be fed back into a
//! bulk import to recreate the same membership and properties.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::models::{ExportRecord, GroupPath, HostProperty, HostRecord, PropertySet};
use crate::services::group_cache::GroupCache;
use crate::services::host_index::HostIndex;
use crate::services::rpc::{RemoteApi, RpcParams};
use crate::utils::{AppError, AppResult};

/// Property listing action for one host
pub const HOST_PROPERTIES_ACTION: &str = "getHostProperties";

/// Decides which host properties are exported
#[derive(Debug, Clone)]
pub struct PropertyFilter {
    excluded: Vec<String>,
    masked_marker: String,
    skip_empty: bool,
}

impl PropertyFilter {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            excluded: config.excluded_properties.clone(),
            masked_marker: config.masked_marker.clone(),
            skip_empty: config.skip_empty,
        }
    }

    /// Whether a property goes into the export
    pub fn allows(&self, name: &str, value: &str) -> bool {
        if self.excluded.iter().any(|e| e == name) {
            return false;
        }
        if self.skip_empty && value.trim().is_empty() {
            return false;
        }
        if !self.masked_marker.is_empty() && value.contains(&self.masked_marker) {
            return false;
        }
        true
    }
}

/// Result of an export run
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub records: Vec<ExportRecord>,
    /// Host names whose properties could not be read
    pub failed: Vec<String>,
}

#[derive(Deserialize)]
struct PropertyList {
    #[serde(default)]
    properties: Vec<HostProperty>,
}

/// Host exporter over a remote API
pub struct Exporter<'a> {
    api: &'a dyn RemoteApi,
    filter: PropertyFilter,
}

impl<'a> Exporter<'a> {
    pub fn new(api: &'a dyn RemoteApi, config: &ExportConfig) -> Self {
        Self {
            api,
            filter: PropertyFilter::from_config(config),
        }
    }

    /// Export every host
    ///
    /// Dynamic groups are left out of each row's group list. A failed group or
    /// host listing aborts the export. A host whose properties cannot
    /// be read is left out and listed in [`ExportReport::failed`].
    pub async fn export(&self) -> AppResult<ExportReport> {
        let groups = GroupCache::load(self.api).await?;
        let index = HostIndex::load(self.api).await?;
        let mut report = ExportReport::default();

        for host in index.hosts() {
            match self.host_properties(host).await {
                Ok(properties) => {
                    let static_groups = static_group_paths(host, &groups);
                    report
                        .records
                        .push(ExportRecord::new(host, &static_groups, &properties));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(host = %host.host_name, error = %e, "Cannot read host properties");
                    report.failed.push(host.host_name.clone());
                }
            }
        }

        info!(
            exported = report.records.len(),
            failed = report.failed.len(),
            "Export complete"
        );
        Ok(report)
    }

    async fn host_properties(&self, host: &HostRecord) -> AppResult<PropertySet> {
        let params = RpcParams::new()
            .set("hostId", host.id)
            .set("filterSystemProperties", true);
        let response = self.api.call(HOST_PROPERTIES_ACTION, &params).await?;
        if !response.is_success() {
            return Err(AppError::Application {
                status: response.status,
                body: response.raw,
            });
        }

        let list: Vec<HostProperty> = match response.data {
            Some(items @ serde_json::Value::Array(_)) => serde_json::from_value(items)?,
            Some(other) => serde_json::from_value::<PropertyList>(other)?.properties,
            None => Vec::new(),
        };

        let properties: PropertySet = list
            .into_iter()
            .filter(|p| self.filter.allows(&p.name, &p.value))
            .map(|p| (p.name, p.value))
            .collect();
        debug!(host = %host.host_name, properties = properties.len(), "Read host properties");
        Ok(properties)
    }
}

/// Paths of the host's groups that are not dynamic
fn static_group_paths(host: &HostRecord, groups: &GroupCache) -> Vec<String> {
    host.group_paths()
        .into_iter()
        .filter(|raw| match GroupPath::parse(raw) {
            Ok(path) => !groups.is_dynamic(&path),
            Err(_) => true,
        })
        .collect()
}
