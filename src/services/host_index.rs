//! Index of existing hosts used by the update flow

use tracing::info;

use crate::models::{HostRecord, ROOT_GROUP_ID};
use crate::services::rpc::{RemoteApi, RpcParams};
use crate::utils::AppResult;

/// Listing action for hosts
pub const LIST_HOSTS_ACTION: &str = "getHosts";

/// Hosts reported by one listing under the root group
#[derive(Debug, Clone, Default)]
pub struct HostIndex {
    hosts: Vec<HostRecord>,
}

impl HostIndex {
    /// Fetch every host below the root group
    pub async fn load(api: &dyn RemoteApi) -> AppResult<Self> {
        let params = RpcParams::new().set("hostGroupId", ROOT_GROUP_ID);
        let data = api
            .call(LIST_HOSTS_ACTION, &params)
            .await?
            .into_listing(LIST_HOSTS_ACTION)?;

        let hosts: Vec<HostRecord> = match data.and_then(|d| d.get("hosts").cloned()) {
            Some(list) if !list.is_null() => serde_json::from_value(list)?,
            _ => Vec::new(),
        };

        info!(hosts = hosts.len(), "Loaded host listing");
        Ok(Self { hosts })
    }

    pub fn from_hosts(hosts: Vec<HostRecord>) -> Self {
        Self { hosts }
    }

    /// Find a host by name and collector, falling back to the display name
    pub fn find(
        &self,
        hostname: &str,
        collector_id: &str,
        display_name: Option<&str>,
    ) -> Option<&HostRecord> {
        self.hosts
            .iter()
            .find(|h| h.host_name == hostname && h.collector_id() == collector_id)
            .or_else(|| {
                let display = display_name?;
                self.hosts.iter().find(|h| h.display_name() == display)
            })
    }

    pub fn hosts(&self) -> &[HostRecord] {
        &self.hosts
    }
}
