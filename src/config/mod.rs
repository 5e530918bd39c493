//! Configuration management
//!
//! This module provides YAML-based configuration management with support for:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for all settings
//! - Command line overrides applied by the binary before validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Remote RPC API connection settings
#[derive(Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Account (company) name, first label of the API host
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// API host suffix after the company label
    #[serde(default = "default_api_host")]
    pub api_host: String,
    /// Full base URL override (e.g. for a proxy); `/rpc/{action}` is appended
    #[serde(default)]
    pub base_url: Option<String>,
    /// Timeout in seconds (supports both timeout_secs and timeout field names)
    #[serde(default = "default_timeout", alias = "timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
}

impl ApiConfig {
    /// Base URL the RPC paths are appended to
    pub fn effective_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.{}",
                self.company,
                self.api_host.trim_matches('/')
            ),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("company", &self.company)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("api_host", &self.api_host)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("ssl_verify", &self.ssl_verify)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            company: String::new(),
            user: String::new(),
            password: String::new(),
            api_host: default_api_host(),
            base_url: None,
            timeout_secs: default_timeout(),
            ssl_verify: default_ssl_verify(),
        }
    }
}

fn default_api_host() -> String {
    "logicmonitor.com/santaba".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_ssl_verify() -> bool {
    true
}

/// What to do with a CSV row that fails validation
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRowPolicy {
    /// Log the row, list it as skipped and continue with the next one
    #[default]
    Skip,
    /// Stop the whole run with a validation error
    Abort,
}

/// Bulk import settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Name prefix of the per-run batch group
    #[serde(default = "default_batch_group_prefix")]
    pub batch_group_prefix: String,
    #[serde(default)]
    pub invalid_rows: InvalidRowPolicy,
    /// `alertEnable` sent for groups created during resolution
    #[serde(default)]
    pub alert_enable: bool,
}

fn default_batch_group_prefix() -> String {
    "bulk-import".to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_group_prefix: default_batch_group_prefix(),
            invalid_rows: InvalidRowPolicy::default(),
            alert_enable: false,
        }
    }
}

/// Bulk export settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Property names never exported
    #[serde(default = "default_excluded_properties")]
    pub excluded_properties: Vec<String>,
    /// Values containing this marker are masked secrets and not exported
    #[serde(default = "default_masked_marker")]
    pub masked_marker: String,
    /// Skip properties whose value is empty
    #[serde(default = "default_skip_empty")]
    pub skip_empty: bool,
}

fn default_excluded_properties() -> Vec<String> {
    vec!["snmp.version".to_string()]
}

fn default_masked_marker() -> String {
    "********".to_string()
}

fn default_skip_empty() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            excluded_properties: default_excluded_properties(),
            masked_marker: default_masked_marker(),
            skip_empty: default_skip_empty(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log output target (console or file)
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file" or "both")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Log file name prefix
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    /// Rotate the log file daily instead of appending to one file
    #[serde(default)]
    pub daily_rotation: bool,
}

/// Log output target
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log to console (stderr)
    #[default]
    Console,
    /// Log to file only
    File,
    /// Log to both console and file
    Both,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

fn default_log_target() -> LogTarget {
    LogTarget::Console
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_prefix() -> String {
    "inventory-sync.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: default_log_target(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML), `explicit_path` first, then standard locations
    /// 3. Environment variables (prefixed with INVENTORY_SYNC_)
    ///
    /// The result is not validated; the caller applies command line overrides
    /// and then calls [`AppConfig::validate`].
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let config_path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| {
                std::env::var("INVENTORY_SYNC_CONFIG")
                    .map(PathBuf::from)
                    .ok()
            })
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) if path.exists() => Self::from_file(path)?,
            Some(ref path) => {
                anyhow::bail!("Configuration file not found: {:?}", path);
            }
            None => AppConfig::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_norway::from_str(contents)?)
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            // Current directory
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            // System config directory
            PathBuf::from("/etc/inventory-sync/config.yaml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("inventory-sync/config.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // API overrides
        if let Ok(company) = std::env::var("INVENTORY_SYNC_COMPANY") {
            self.api.company = company;
        }
        if let Ok(user) = std::env::var("INVENTORY_SYNC_USER") {
            self.api.user = user;
        }
        if let Ok(password) = std::env::var("INVENTORY_SYNC_PASSWORD") {
            self.api.password = password;
        }
        if let Ok(host) = std::env::var("INVENTORY_SYNC_API_HOST") {
            self.api.api_host = host;
        }
        if let Ok(url) = std::env::var("INVENTORY_SYNC_BASE_URL") {
            self.api.base_url = Some(url);
        }
        if let Ok(timeout) = std::env::var("INVENTORY_SYNC_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.api.timeout_secs = t;
            }
        }

        // Logging overrides
        if let Ok(format) = std::env::var("INVENTORY_SYNC_LOG_FORMAT") {
            self.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => LogFormat::Compact,
            };
        }
        if let Ok(target) = std::env::var("INVENTORY_SYNC_LOG_TARGET") {
            self.logging.target = match target.to_lowercase().as_str() {
                "file" => LogTarget::File,
                "both" => LogTarget::Both,
                _ => LogTarget::Console,
            };
        }
        if let Ok(dir) = std::env::var("INVENTORY_SYNC_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(dir);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_none() && self.api.company.trim().is_empty() {
            anyhow::bail!("Missing company: pass -c <company> or set api.company");
        }
        if self.api.user.is_empty() {
            anyhow::bail!("Missing user: pass -u <user> or set api.user");
        }
        if self.api.password.is_empty() {
            anyhow::bail!("Missing password: pass -p <password> or set api.password");
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("API timeout must be greater than 0 seconds");
        }
        if self.import.batch_group_prefix.trim().is_empty()
            || self.import.batch_group_prefix.contains('/')
        {
            anyhow::bail!(
                "Invalid batch group prefix: {:?}",
                self.import.batch_group_prefix
            );
        }
        if !self.api.ssl_verify {
            tracing::warn!("SSL certificate verification is DISABLED - this is insecure!");
        }

        Ok(())
    }
}
