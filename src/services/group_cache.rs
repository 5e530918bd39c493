//! Session-scoped group path cache
//!
//! Maps full group paths to group ids. Filled by one `getHostGroups` listing
//! at the start of a run and updated as groups are created, so a path is looked
//! up remotely at most once per run. Nothing is persisted between runs.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::models::{GroupPath, GroupRecord, ROOT_GROUP_ID};
use crate::services::rpc::{RemoteApi, RpcParams};
use crate::utils::AppResult;

/// Listing action for host groups
pub const LIST_GROUPS_ACTION: &str = "getHostGroups";

/// Full path to group id mapping
#[derive(Debug, Clone, Default)]
pub struct GroupCache {
    ids: HashMap<String, i64>,
    records: HashMap<String, GroupRecord>,
}

impl GroupCache {
    /// An empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the full group listing and build the cache
    ///
    /// A listing whose `data` is absent or null yields an empty cache.
    pub async fn load(api: &dyn RemoteApi) -> AppResult<Self> {
        let mut cache = Self::new();
        let count = cache.refresh(api).await?;
        info!(groups = count, "Loaded group listing");
        Ok(cache)
    }

    /// Re-read the listing and merge it into the cache
    pub async fn refresh(&mut self, api: &dyn RemoteApi) -> AppResult<usize> {
        let data = api
            .call(LIST_GROUPS_ACTION, &RpcParams::new())
            .await?
            .into_listing(LIST_GROUPS_ACTION)?;

        let records: Vec<GroupRecord> = match data {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };

        let count = records.len();
        for record in records {
            self.insert_record(record);
        }
        debug!(groups = count, "Merged group listing into cache");
        Ok(count)
    }

    /// Build a cache from already fetched records
    pub fn from_records(records: impl IntoIterator<Item = GroupRecord>) -> Self {
        let mut cache = Self::new();
        for record in records {
            cache.insert_record(record);
        }
        cache
    }

    fn insert_record(&mut self, record: GroupRecord) {
        let key = normalize(&record.full_path);
        self.ids.insert(key.clone(), record.id);
        self.records.insert(key, record);
    }

    /// Cached id of a path; the root always resolves
    pub fn get(&self, path: &GroupPath) -> Option<i64> {
        if path.is_root() {
            return Some(ROOT_GROUP_ID);
        }
        self.ids.get(&path.full_path()).copied()
    }

    /// Record a newly created group
    pub fn put(&mut self, record: GroupRecord) {
        self.insert_record(record);
    }

    /// Cached record of a path
    pub fn record(&self, path: &GroupPath) -> Option<&GroupRecord> {
        self.records.get(&path.full_path())
    }

    /// Whether the platform computes membership of this group itself
    pub fn is_dynamic(&self, path: &GroupPath) -> bool {
        self.record(path).is_some_and(GroupRecord::is_dynamic)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn normalize(full_path: &str) -> String {
    full_path.trim_matches('/').to_string()
}
