//! Business logic services

pub mod csv_io;
pub mod exporter;
pub mod group_cache;
pub mod group_import;
pub mod host_index;
pub mod path_resolver;
pub mod reconciler;
pub mod rpc;
pub mod summary;

pub use exporter::{ExportReport, Exporter, PropertyFilter};
pub use group_cache::GroupCache;
pub use group_import::GroupImporter;
pub use host_index::HostIndex;
pub use path_resolver::PathResolver;
pub use reconciler::{BulkReconciler, ReconcileMode};
pub use rpc::{ApiResponse, RemoteApi, RpcClient, RpcParams};
pub use summary::{OutcomeKind, RunSummary, UploadOutcome};
