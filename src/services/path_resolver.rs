//! Group path resolution with lazy ancestor creation
//!
//! Resolving `/a/b/c` returns the id of `a/b/c`, creating whichever of `a`,
//! `a/b` and `a/b/c` do not exist yet. Creation always runs parent before child
//! because a group can only be created under a known parent id. Every created
//! group is recorded in the [`GroupCache`], so repeated resolution of the same
//! path within a run issues no further remote calls.

use tracing::{debug, info, warn};

use crate::models::{GroupPath, GroupRecord, GroupSpec, ROOT_GROUP_ID};
use crate::services::group_cache::GroupCache;
use crate::services::rpc::{ApiResponse, RemoteApi, RpcParams};
use crate::utils::{AppError, AppResult};

/// Creation action for host groups
pub const ADD_GROUP_ACTION: &str = "addHostGroup";

/// Resolves group paths to ids against a remote API
pub struct PathResolver<'a> {
    api: &'a dyn RemoteApi,
    alert_enable: bool,
}

impl<'a> PathResolver<'a> {
    pub fn new(api: &'a dyn RemoteApi, alert_enable: bool) -> Self {
        Self { api, alert_enable }
    }

    /// Resolve `path` to a group id, creating missing groups
    ///
    /// `spec` applies to the leaf only, and only if the leaf has to be created.
    pub async fn resolve(
        &self,
        cache: &mut GroupCache,
        path: &GroupPath,
        spec: &GroupSpec,
    ) -> AppResult<i64> {
        if let Some(id) = cache.get(path) {
            debug!(path = %path, id, "Group path cached");
            return Ok(id);
        }

        // Deepest ancestor already known; the root is always known.
        let mut known = path.depth() - 1;
        let mut parent_id = ROOT_GROUP_ID;
        while known > 0 {
            if let Some(id) = cache.get(&path.prefix(known)) {
                parent_id = id;
                break;
            }
            known -= 1;
        }

        let ancestor_spec = GroupSpec::default();
        for len in (known + 1)..=path.depth() {
            let current = path.prefix(len);
            let leaf_spec = if len == path.depth() {
                spec
            } else {
                &ancestor_spec
            };
            parent_id = self.create_group(cache, &current, parent_id, leaf_spec).await?;
        }

        Ok(parent_id)
    }

    /// Create the group `path` under `parent_id` and cache its id
    ///
    /// A duplicate answer for a path the cache did not know triggers one
    /// listing refresh before giving up.
    pub async fn create_group(
        &self,
        cache: &mut GroupCache,
        path: &GroupPath,
        parent_id: i64,
        spec: &GroupSpec,
    ) -> AppResult<i64> {
        let response = self.add_group(path, parent_id, spec).await?;

        if let Some(id) = response.data_id() {
            info!(path = %path, id, parent_id, "Created group");
            cache.put(GroupRecord::created(path, id, parent_id, spec));
            return Ok(id);
        }

        if response.is_duplicate() {
            warn!(path = %path, "Group already exists remotely, refreshing group listing");
            cache.refresh(self.api).await?;
            if let Some(id) = cache.get(path) {
                return Ok(id);
            }
        }

        Err(AppError::GroupCreationFailed {
            path: path.to_string(),
            body: response.raw,
        })
    }

    /// Issue the raw creation call for `path` under `parent_id`
    pub async fn add_group(
        &self,
        path: &GroupPath,
        parent_id: i64,
        spec: &GroupSpec,
    ) -> AppResult<ApiResponse> {
        let name = path.name().ok_or_else(|| {
            AppError::Validation("The root group cannot be created".to_string())
        })?;

        let mut params = RpcParams::new()
            .set("name", name)
            .set("parentId", parent_id)
            .set("alertEnable", self.alert_enable)
            .set("dGroup", spec.dynamic);
        if spec.dynamic {
            params = params.set_opt("appliesTo", spec.applies_to.as_deref());
        }
        let params = params
            .set_opt("description", spec.description.as_deref())
            .properties(&spec.properties);

        debug!(path = %path, parent_id, dynamic = spec.dynamic, "Creating group");
        self.api.call(ADD_GROUP_ACTION, &params).await
    }
}
