//! Inventory Sync Library
//!
//! Bulk management of monitored hosts and their group hierarchy through a
//! monitoring platform's RPC API: CSV-driven host import, update and export,
//! and bulk group creation.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::info;

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use utils::{AppError, AppResult};

use models::{GroupDefinition, ImportRecord};
use services::exporter::{ExportReport, Exporter};
use services::group_cache::GroupCache;
use services::group_import::GroupImporter;
use services::host_index::HostIndex;
use services::path_resolver::PathResolver;
use services::reconciler::{create_batch_group, BulkReconciler, ReconcileMode};
use services::rpc::{RemoteApi, RpcClient};
use services::summary::RunSummary;

/// Per-run context: configuration and remote API client
///
/// Each operation loads its own [`GroupCache`], so nothing is shared between
/// runs.
#[derive(Clone)]
pub struct Session {
    /// Application configuration
    pub config: AppConfig,
    /// Remote API the run talks to
    pub api: Arc<dyn RemoteApi>,
}

impl Session {
    /// Create a session backed by the HTTP RPC client
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let client = RpcClient::new(&config.api)?;
        Ok(Self::with_api(config, Arc::new(client)))
    }

    /// Create a session over any remote API implementation
    pub fn with_api(config: AppConfig, api: Arc<dyn RemoteApi>) -> Self {
        Self { config, api }
    }

    pub fn api(&self) -> &dyn RemoteApi {
        self.api.as_ref()
    }

    /// Fetch the current group listing
    pub async fn load_group_cache(&self) -> AppResult<GroupCache> {
        GroupCache::load(self.api()).await
    }

    /// Add hosts, placing each one in a fresh batch group as well
    pub async fn import_hosts(&self, records: &[ImportRecord]) -> AppResult<RunSummary> {
        self.import_hosts_at(records, Local::now()).await
    }

    /// Add hosts with the batch group named after `started`
    pub async fn import_hosts_at(
        &self,
        records: &[ImportRecord],
        started: DateTime<Local>,
    ) -> AppResult<RunSummary> {
        let import = &self.config.import;
        let mut cache = self.load_group_cache().await?;

        let resolver = PathResolver::new(self.api(), import.alert_enable);
        let (_, batch_group_id) =
            create_batch_group(&resolver, &mut cache, &import.batch_group_prefix, started).await?;

        BulkReconciler::new(self.api(), ReconcileMode::Add { batch_group_id }, import)
            .run(records, &mut cache)
            .await
    }

    /// Update existing hosts found in the host listing
    pub async fn update_hosts(&self, records: &[ImportRecord]) -> AppResult<RunSummary> {
        let mut cache = self.load_group_cache().await?;
        let hosts = HostIndex::load(self.api()).await?;

        BulkReconciler::new(self.api(), ReconcileMode::Update { hosts }, &self.config.import)
            .run(records, &mut cache)
            .await
    }

    /// Create groups from definition rows
    pub async fn import_groups(&self, definitions: &[GroupDefinition]) -> AppResult<RunSummary> {
        let mut cache = self.load_group_cache().await?;
        info!(groups = cache.len(), definitions = definitions.len(), "Importing groups");

        GroupImporter::new(self.api(), &self.config.import)
            .run(definitions, &mut cache)
            .await
    }

    /// Export every host with its groups and filtered properties
    pub async fn export_hosts(&self) -> AppResult<ExportReport> {
        Exporter::new(self.api(), &self.config.export).export().await
    }
}
