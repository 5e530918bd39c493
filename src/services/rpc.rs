//! Monitoring platform RPC client
//!
//! Every API operation is an HTTPS `GET /rpc/{action}` whose parameters travel
//! in the query string, with the account credentials (`c`, `u`, `p`) appended to
//! each call. Responses are a JSON envelope `{status, data}`; `status` carries
//! the application result independently of the HTTP status.
//!
//! Requests are sent one at a time with a bounded timeout and are never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::models::PropertySet;
use crate::utils::{AppError, AppResult};

/// Application status for a successful call
pub const STATUS_OK: i64 = 200;

/// Application status for a resource that already exists
pub const STATUS_DUPLICATE: i64 = 600;

/// Seam between the engine and the remote API
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Invoke `action` with `params` and return the decoded envelope
    ///
    /// Transport failures and undecodable bodies are `RemoteUnavailable`;
    /// application-level failures come back as a response with a non-200 status.
    async fn call(&self, action: &str, params: &RpcParams) -> AppResult<ApiResponse>;
}

/// Ordered RPC parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RpcParams {
    pairs: Vec<(String, String)>,
}

impl RpcParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn set(mut self, name: &str, value: impl ToString) -> Self {
        self.pairs.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a parameter when a value is present
    pub fn set_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.set(name, v),
            None => self,
        }
    }

    /// Add encoded `propNameN`/`propValueN` pairs
    pub fn properties(mut self, properties: &PropertySet) -> Self {
        self.pairs.extend(properties.encode());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(n, v)| format!("{}={}", urlencoding::encode(n), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Decoded response envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: i64,
    pub data: Option<serde_json::Value>,
    pub errmsg: Option<String>,
    /// Response body exactly as received
    pub raw: String,
}

#[derive(Deserialize)]
struct Envelope {
    status: i64,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errmsg: Option<String>,
}

impl ApiResponse {
    /// Decode a response body
    pub fn parse(body: impl Into<String>) -> AppResult<Self> {
        let raw = body.into();
        let envelope: Envelope = serde_json::from_str(&raw)?;
        Ok(Self {
            status: envelope.status,
            data: envelope.data.filter(|d| !d.is_null()),
            errmsg: envelope.errmsg,
            raw,
        })
    }

    /// Build a response from parts; `raw` is the serialized envelope
    pub fn new(status: i64, data: Option<serde_json::Value>) -> Self {
        let raw = serde_json::json!({ "status": status, "data": data }).to_string();
        Self {
            status,
            data: data.filter(|d| !d.is_null()),
            errmsg: None,
            raw,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn is_duplicate(&self) -> bool {
        self.status == STATUS_DUPLICATE
    }

    /// `data.id` of a creation response
    pub fn data_id(&self) -> Option<i64> {
        self.data.as_ref()?.get("id")?.as_i64()
    }

    /// Require success for a listing call
    pub fn into_listing(self, action: &str) -> AppResult<Option<serde_json::Value>> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(AppError::ListingFailed {
                action: action.to_string(),
                status: self.status,
                body: self.raw,
            })
        }
    }
}

/// HTTP implementation of [`RemoteApi`]
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    base_url: String,
    company: String,
    user: String,
    password: String,
}

impl RpcClient {
    /// Create a new client with a bounded per-request timeout
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let base_url = config.effective_base_url();
        info!("Initializing RPC client for {}", base_url);

        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if !config.ssl_verify {
            warn!("SSL certificate verification is DISABLED - this is insecure!");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url,
            company: config.company.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_url(&self, action: &str, params: &RpcParams) -> String {
        let auth = RpcParams::new()
            .set("c", &self.company)
            .set("u", &self.user)
            .set("p", &self.password);
        if params.is_empty() {
            format!("{}/rpc/{}?{}", self.base_url, action, auth.to_query_string())
        } else {
            format!(
                "{}/rpc/{}?{}&{}",
                self.base_url,
                action,
                params.to_query_string(),
                auth.to_query_string()
            )
        }
    }
}

#[async_trait]
impl RemoteApi for RpcClient {
    async fn call(&self, action: &str, params: &RpcParams) -> AppResult<ApiResponse> {
        let url = self.request_url(action, params);
        debug!(action = %action, params = ?params.iter().collect::<Vec<_>>(), "RPC request");

        let response = self.client.get(&url).send().await?;
        let http_status = response.status();
        let body = response.text().await?;

        match ApiResponse::parse(body) {
            Ok(parsed) => {
                debug!(action = %action, status = parsed.status, "RPC response");
                Ok(parsed)
            }
            Err(e) => {
                warn!(action = %action, http_status = %http_status, "Undecodable RPC response");
                Err(e)
            }
        }
    }
}
