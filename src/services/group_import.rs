//! Bulk group creation from group definition rows

use tracing::{info, warn};

use crate::config::{ImportConfig, InvalidRowPolicy};
use crate::models::{GroupDefinition, GroupPath, GroupRecord, GroupSpec, ROOT_GROUP_ID};
use crate::services::group_cache::GroupCache;
use crate::services::path_resolver::PathResolver;
use crate::services::rpc::RemoteApi;
use crate::services::summary::{OutcomeKind, RunSummary, UploadOutcome};
use crate::utils::AppResult;

/// Creates static and dynamic groups through the path resolver
pub struct GroupImporter<'a> {
    resolver: PathResolver<'a>,
    invalid_rows: InvalidRowPolicy,
}

impl<'a> GroupImporter<'a> {
    pub fn new(api: &'a dyn RemoteApi, config: &ImportConfig) -> Self {
        Self {
            resolver: PathResolver::new(api, config.alert_enable),
            invalid_rows: config.invalid_rows,
        }
    }

    /// Create every defined group that does not exist yet
    pub async fn run(
        &self,
        definitions: &[GroupDefinition],
        cache: &mut GroupCache,
    ) -> AppResult<RunSummary> {
        let mut summary = RunSummary::new("Bulk Group Import Summary");

        for def in definitions {
            let path = match def.target_path() {
                Ok(path) => path,
                Err(e) => match self.invalid_rows {
                    InvalidRowPolicy::Abort => return Err(e),
                    InvalidRowPolicy::Skip => {
                        warn!(line = def.line, error = %e, "Skipping invalid group row");
                        summary.skip(
                            def.name
                                .clone()
                                .unwrap_or_else(|| format!("<line {}>", def.line)),
                        );
                        continue;
                    }
                },
            };

            let outcome = match self.create(&path, &def.spec(), cache).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    e.log();
                    UploadOutcome::failed(e.to_string())
                }
            };

            if outcome.kind == OutcomeKind::Failed {
                warn!(group = %path, response = %outcome.response, "Group creation failed");
            } else {
                info!(group = %path, outcome = %outcome.kind, "Group processed");
            }
            summary.record(&outcome, path.to_string());
        }

        Ok(summary)
    }

    async fn create(
        &self,
        path: &GroupPath,
        spec: &GroupSpec,
        cache: &mut GroupCache,
    ) -> AppResult<UploadOutcome> {
        if cache.get(path).is_some() {
            return Ok(UploadOutcome::duplicate(format!(
                "Group '{}' already exists",
                path
            )));
        }

        let parent_id = match path.parent() {
            Some(parent) => {
                self.resolver
                    .resolve(cache, &parent, &GroupSpec::default())
                    .await?
            }
            None => ROOT_GROUP_ID,
        };

        let response = self.resolver.add_group(path, parent_id, spec).await?;
        if let Some(id) = response.data_id() {
            cache.put(GroupRecord::created(path, id, parent_id, spec));
        }
        Ok(UploadOutcome::from_response(&response))
    }
}
