//! Bulk host reconciliation
//!
//! Each import record goes through four steps: validate the row, resolve its
//! group paths to ids, issue the `addHost` or `updateHost` call, and classify
//! the answer into the [`RunSummary`]. Records are processed strictly one after
//! the other. Errors that only concern one record mark it failed; transport and
//! listing errors abort the run.

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::config::{ImportConfig, InvalidRowPolicy};
use crate::models::{GroupPath, GroupSpec, ImportRecord};
use crate::services::group_cache::GroupCache;
use crate::services::host_index::HostIndex;
use crate::services::path_resolver::PathResolver;
use crate::services::rpc::{RemoteApi, RpcParams};
use crate::services::summary::{OutcomeKind, RunSummary, UploadOutcome};
use crate::utils::AppResult;

/// Creation action for hosts
pub const ADD_HOST_ACTION: &str = "addHost";

/// Update action for existing hosts
pub const UPDATE_HOST_ACTION: &str = "updateHost";

/// What the reconciler does with each valid record
#[derive(Debug, Clone)]
pub enum ReconcileMode {
    /// Create hosts; every host also joins the run's batch group
    Add { batch_group_id: i64 },
    /// Update hosts found in the listing
    Update { hosts: HostIndex },
}

impl ReconcileMode {
    fn title(&self) -> &'static str {
        match self {
            ReconcileMode::Add { .. } => "Bulk Add Summary",
            ReconcileMode::Update { .. } => "Bulk Update Summary",
        }
    }
}

/// Drives import records through group resolution and upsert
pub struct BulkReconciler<'a> {
    api: &'a dyn RemoteApi,
    resolver: PathResolver<'a>,
    mode: ReconcileMode,
    invalid_rows: InvalidRowPolicy,
}

impl<'a> BulkReconciler<'a> {
    pub fn new(api: &'a dyn RemoteApi, mode: ReconcileMode, config: &ImportConfig) -> Self {
        Self {
            api,
            resolver: PathResolver::new(api, config.alert_enable),
            mode,
            invalid_rows: config.invalid_rows,
        }
    }

    /// Process every record and return the tally
    pub async fn run(
        &self,
        records: &[ImportRecord],
        cache: &mut GroupCache,
    ) -> AppResult<RunSummary> {
        let mut summary = RunSummary::new(self.mode.title());
        info!(records = records.len(), "Starting bulk run");

        for record in records {
            if let Err(e) = record.validate() {
                match self.invalid_rows {
                    InvalidRowPolicy::Abort => return Err(e),
                    InvalidRowPolicy::Skip => {
                        warn!(line = record.line, error = %e, "Skipping invalid row");
                        summary.skip(record.label());
                        continue;
                    }
                }
            }

            let outcome = match self.process(record, cache).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    e.log();
                    UploadOutcome::failed(e.to_string())
                }
            };

            match outcome.kind {
                OutcomeKind::Created => info!(host = %record.label(), "Host uploaded"),
                OutcomeKind::Duplicate => info!(host = %record.label(), "Host already present"),
                OutcomeKind::Failed => {
                    warn!(host = %record.label(), response = %outcome.response, "Host upload failed")
                }
            }
            summary.record(&outcome, record.label());
        }

        Ok(summary)
    }

    async fn process(
        &self,
        record: &ImportRecord,
        cache: &mut GroupCache,
    ) -> AppResult<UploadOutcome> {
        let hostname = record.hostname.as_deref().unwrap_or_default();
        let collector_id = record.collector_id.as_deref().unwrap_or_default();

        let (action, mut params) = match &self.mode {
            ReconcileMode::Add { .. } => (ADD_HOST_ACTION, RpcParams::new()),
            ReconcileMode::Update { hosts } => {
                let Some(host) = hosts.find(hostname, collector_id, record.display_name.as_deref())
                else {
                    return Ok(UploadOutcome::failed(format!(
                        "Host '{}' with collector {} not found",
                        hostname, collector_id
                    )));
                };
                (UPDATE_HOST_ACTION, RpcParams::new().set("id", host.id))
            }
        };

        let group_ids = self.resolve_groups(record, cache).await?;

        params = params
            .set("hostName", hostname)
            .set("displayedAs", record.effective_display_name())
            .set("agentId", collector_id);
        if !group_ids.is_empty() {
            let joined = group_ids
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params = params.set("hostGroupIds", joined);
        }
        let params = params
            .set_opt("description", record.description.as_deref())
            .set_opt("link", record.link.as_deref())
            .properties(&record.property_set());

        debug!(host = %hostname, action, groups = ?group_ids, "Upserting host");
        let response = self.api.call(action, &params).await?;
        Ok(UploadOutcome::from_response(&response))
    }

    /// Group ids of the record in input order, batch group last
    ///
    /// Dynamic groups are left out: the platform assigns their members and
    /// rejects explicit membership.
    async fn resolve_groups(
        &self,
        record: &ImportRecord,
        cache: &mut GroupCache,
    ) -> AppResult<Vec<i64>> {
        let mut ids = Vec::new();
        for path in record.group_paths()? {
            let id = self.resolver.resolve(cache, &path, &GroupSpec::default()).await?;
            if cache.is_dynamic(&path) {
                warn!(
                    host = %record.label(),
                    group = %path,
                    "Ignoring dynamic group membership"
                );
                continue;
            }
            ids.push(id);
        }
        if let ReconcileMode::Add { batch_group_id } = &self.mode {
            ids.push(*batch_group_id);
        }
        Ok(ids)
    }
}

/// Name of the batch group for a run started at `now`
pub fn batch_group_name(prefix: &str, now: DateTime<Local>) -> String {
    format!("{}-{}", prefix, now.format("%Y%m%d%H%M%S"))
}

/// Create the per-run batch group at the root
///
/// Every host added by the run joins this group. Failing to create it aborts
/// the run.
pub async fn create_batch_group(
    resolver: &PathResolver<'_>,
    cache: &mut GroupCache,
    prefix: &str,
    now: DateTime<Local>,
) -> AppResult<(GroupPath, i64)> {
    let path = GroupPath::root().child(&batch_group_name(prefix, now))?;
    let id = resolver.resolve(cache, &path, &GroupSpec::default()).await?;
    info!(group = %path, id, "Created batch group");
    Ok((path, id))
}
