//! Test fixtures for common test data

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};

use inventory_sync::config::InvalidRowPolicy;
use inventory_sync::models::ImportRecord;
use inventory_sync::{AppConfig, Session};

use super::mocks::MockRemoteApi;

/// Configuration with credentials filled in
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.api.company = "acme".to_string();
    config.api.user = "apiuser".to_string();
    config.api.password = "secret".to_string();
    config
}

/// Session over a mock API with the given invalid row policy
pub fn mock_session(api: &Arc<MockRemoteApi>, policy: InvalidRowPolicy) -> Session {
    let mut config = test_config();
    config.import.invalid_rows = policy;
    Session::with_api(config, api.clone())
}

/// Fixed start time of a run
pub fn run_started() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap()
}

/// Batch group path created by a run started at [`run_started`]
pub const BATCH_GROUP: &str = "bulk-import-20240517093000";

/// Import record with host name, collector and group list
pub fn host_record(hostname: &str, collector_id: &str, group_list: Option<&str>) -> ImportRecord {
    ImportRecord {
        line: 2,
        hostname: Some(hostname.to_string()),
        collector_id: Some(collector_id.to_string()),
        group_list: group_list.map(str::to_string),
        ..Default::default()
    }
}

/// Host import CSV with a commented row and an invalid row
pub const HOSTS_CSV: &str = "\
hostname,collector_id,display_name,description,properties,group_list,link
web01,5,Web 01,frontend,owner=web:tier=1,/Linux/Web:/Prod,
web02,5,,,owner=web,/Linux/Web,
#old01,5,,,,/Linux,
,5,nameless,,,/Linux,
db01,7,,database,owner=dba,/Linux/DB,https://wiki/db01
";

/// Group definition CSV with a static and a dynamic group
pub const GROUPS_CSV: &str = "\
groupname,grouppath,appliesTo,description,properties
Linux,/,,All Linux hosts,os=linux
Web,/Linux,system.displayname =~ \"web\",Web servers,tier=web
Racks,/DC1/Row A,,,
";
