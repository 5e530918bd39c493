//! Mock services for testing
//!
//! Provides an in-memory implementation of the monitoring RPC API that keeps a
//! group tree and a host list, answers the actions the engine uses and records
//! every call for later assertions.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::json;

use inventory_sync::models::ROOT_GROUP_ID;
use inventory_sync::services::rpc::{ApiResponse, RemoteApi, RpcParams};
use inventory_sync::{AppError, AppResult};

/// Types of transport errors the mock can simulate
#[derive(Debug, Clone)]
pub enum MockError {
    /// Connection refused
    ConnectionRefused,
    /// Timeout
    Timeout,
}

/// A group held by the mock
#[derive(Debug, Clone)]
pub struct MockGroup {
    pub id: i64,
    pub full_path: String,
    pub parent_id: i64,
    pub applies_to: Option<String>,
    pub description: Option<String>,
    pub properties: Vec<(String, String)>,
}

/// A host held by the mock
#[derive(Debug, Clone)]
pub struct MockHost {
    pub id: i64,
    pub host_name: String,
    pub displayed_as: String,
    pub agent_id: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub group_ids: Vec<i64>,
    pub properties: Vec<(String, String)>,
}

#[derive(Default)]
struct MockState {
    groups: Vec<MockGroup>,
    hosts: Vec<MockHost>,
    next_id: i64,
    calls: Vec<(String, RpcParams)>,
    forced: HashMap<String, ApiResponse>,
    /// Group paths the listing does not report
    hidden: Vec<String>,
    error_mode: Option<MockError>,
}

/// Mock monitoring RPC API
pub struct MockRemoteApi {
    state: RwLock<MockState>,
}

impl Default for MockRemoteApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteApi {
    /// Create a mock with only the root group
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MockState {
                next_id: 100,
                ..Default::default()
            }),
        }
    }

    /// Create the groups of `path` (and its ancestors) and return its id
    pub fn add_group_path(&self, path: &str) -> i64 {
        let mut state = self.state.write().unwrap();
        let mut parent_id = ROOT_GROUP_ID;
        let mut current = String::new();
        for segment in path.trim_matches('/').split('/') {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            let existing = state
                .groups
                .iter()
                .find(|g| g.full_path == current)
                .map(|g| g.id);
            parent_id = match existing {
                Some(id) => id,
                None => state.insert_group(&current, parent_id, None, None, Vec::new()),
            };
        }
        parent_id
    }

    /// Create a dynamic group (ancestors are static) and return its id
    pub fn add_dynamic_group(&self, path: &str, applies_to: &str) -> i64 {
        let id = self.add_group_path(path);
        let mut state = self.state.write().unwrap();
        if let Some(group) = state.groups.iter_mut().find(|g| g.id == id) {
            group.applies_to = Some(applies_to.to_string());
        }
        id
    }

    /// Keep an existing group out of `getHostGroups` answers
    pub fn hide_from_listing(&self, path: &str) {
        self.state
            .write()
            .unwrap()
            .hidden
            .push(path.trim_matches('/').to_string());
    }

    /// Add a host directly
    pub fn add_host(
        &self,
        host_name: &str,
        agent_id: &str,
        groups: &[&str],
        properties: &[(&str, &str)],
    ) -> i64 {
        let group_ids: Vec<i64> = groups.iter().map(|g| self.add_group_path(g)).collect();
        let mut state = self.state.write().unwrap();
        let id = state.take_id();
        state.hosts.push(MockHost {
            id,
            host_name: host_name.to_string(),
            displayed_as: host_name.to_string(),
            agent_id: agent_id.to_string(),
            description: None,
            link: None,
            group_ids,
            properties: properties
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        });
        id
    }

    /// Answer every call of `action` with `response`
    pub fn force_response(&self, action: &str, response: ApiResponse) {
        self.state
            .write()
            .unwrap()
            .forced
            .insert(action.to_string(), response);
    }

    /// Set error mode to simulate transport failures
    pub fn set_error_mode(&self, error: MockError) {
        self.state.write().unwrap().error_mode = Some(error);
    }

    /// Clear error mode
    pub fn clear_error_mode(&self) {
        self.state.write().unwrap().error_mode = None;
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<(String, RpcParams)> {
        self.state.read().unwrap().calls.clone()
    }

    /// Parameters of every call of `action`, in order
    pub fn calls_for(&self, action: &str) -> Vec<RpcParams> {
        self.calls()
            .into_iter()
            .filter(|(a, _)| a == action)
            .map(|(_, p)| p)
            .collect()
    }

    /// Names of the groups created through `addHostGroup`, in order
    pub fn created_group_names(&self) -> Vec<String> {
        self.calls_for("addHostGroup")
            .iter()
            .filter_map(|p| p.get("name").map(str::to_string))
            .collect()
    }

    pub fn group(&self, path: &str) -> Option<MockGroup> {
        let path = path.trim_matches('/');
        self.state
            .read()
            .unwrap()
            .groups
            .iter()
            .find(|g| g.full_path == path)
            .cloned()
    }

    pub fn group_id(&self, path: &str) -> Option<i64> {
        self.group(path).map(|g| g.id)
    }

    pub fn group_count(&self) -> usize {
        self.state.read().unwrap().groups.len()
    }

    pub fn host(&self, host_name: &str) -> Option<MockHost> {
        self.state
            .read()
            .unwrap()
            .hosts
            .iter()
            .find(|h| h.host_name == host_name)
            .cloned()
    }

    pub fn hosts(&self) -> Vec<MockHost> {
        self.state.read().unwrap().hosts.clone()
    }

    /// Full paths of the groups a host belongs to, sorted
    pub fn host_group_paths(&self, host_name: &str) -> Vec<String> {
        let state = self.state.read().unwrap();
        let mut paths: Vec<String> = state
            .hosts
            .iter()
            .find(|h| h.host_name == host_name)
            .map(|h| h.group_ids.iter().filter_map(|id| state.path_of(*id)).collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}

impl MockState {
    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert_group(
        &mut self,
        full_path: &str,
        parent_id: i64,
        applies_to: Option<String>,
        description: Option<String>,
        properties: Vec<(String, String)>,
    ) -> i64 {
        let id = self.take_id();
        self.groups.push(MockGroup {
            id,
            full_path: full_path.to_string(),
            parent_id,
            applies_to,
            description,
            properties,
        });
        id
    }

    fn path_of(&self, id: i64) -> Option<String> {
        if id == ROOT_GROUP_ID {
            return Some(String::new());
        }
        self.groups
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.full_path.clone())
    }

    fn get_host_groups(&self) -> ApiResponse {
        let groups: Vec<_> = self
            .groups
            .iter()
            .filter(|g| !self.hidden.contains(&g.full_path))
            .map(|g| {
                json!({
                    "id": g.id,
                    "name": g.full_path.rsplit('/').next().unwrap_or_default(),
                    "fullPath": g.full_path,
                    "parentId": g.parent_id,
                    "appliesTo": g.applies_to.clone().unwrap_or_default(),
                })
            })
            .collect();
        ApiResponse::new(200, Some(json!(groups)))
    }

    fn add_host_group(&mut self, params: &RpcParams) -> ApiResponse {
        let name = params.get("name").unwrap_or_default().to_string();
        let parent_id: i64 = params
            .get("parentId")
            .and_then(|p| p.parse().ok())
            .unwrap_or(ROOT_GROUP_ID);

        let Some(parent_path) = self.path_of(parent_id) else {
            return ApiResponse::new(1007, None);
        };
        let full_path = if parent_path.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", parent_path, name)
        };
        if self.groups.iter().any(|g| g.full_path == full_path) {
            return ApiResponse::new(600, None);
        }

        let applies_to = if params.get("dGroup") == Some("true") {
            params.get("appliesTo").map(str::to_string)
        } else {
            None
        };
        let id = self.insert_group(
            &full_path,
            parent_id,
            applies_to,
            params.get("description").map(str::to_string),
            decode_properties(params),
        );
        ApiResponse::new(200, Some(json!({ "id": id, "name": name })))
    }

    /// Explicit membership in a dynamic group is refused
    fn assigns_dynamic_group(&self, params: &RpcParams) -> bool {
        parse_group_ids(params).iter().any(|id| {
            self.groups
                .iter()
                .any(|g| g.id == *id && g.applies_to.is_some())
        })
    }

    fn add_host(&mut self, params: &RpcParams) -> ApiResponse {
        if self.assigns_dynamic_group(params) {
            return ApiResponse::new(1001, None);
        }
        let host_name = params.get("hostName").unwrap_or_default().to_string();
        let agent_id = params.get("agentId").unwrap_or_default().to_string();
        if self
            .hosts
            .iter()
            .any(|h| h.host_name == host_name && h.agent_id == agent_id)
        {
            return ApiResponse::new(600, None);
        }

        let id = self.take_id();
        self.hosts.push(MockHost {
            id,
            displayed_as: params.get("displayedAs").unwrap_or(host_name.as_str()).to_string(),
            host_name,
            agent_id,
            description: params.get("description").map(str::to_string),
            link: params.get("link").map(str::to_string),
            group_ids: parse_group_ids(params),
            properties: decode_properties(params),
        });
        ApiResponse::new(200, Some(json!({ "id": id })))
    }

    fn update_host(&mut self, params: &RpcParams) -> ApiResponse {
        if self.assigns_dynamic_group(params) {
            return ApiResponse::new(1001, None);
        }
        let id: i64 = params.get("id").and_then(|p| p.parse().ok()).unwrap_or(0);
        let group_ids = params.get("hostGroupIds").map(|_| parse_group_ids(params));
        let properties = decode_properties(params);
        let Some(host) = self.hosts.iter_mut().find(|h| h.id == id) else {
            return ApiResponse::new(1069, None);
        };

        if let Some(name) = params.get("displayedAs") {
            host.displayed_as = name.to_string();
        }
        if let Some(description) = params.get("description") {
            host.description = Some(description.to_string());
        }
        if let Some(ids) = group_ids {
            host.group_ids = ids;
        }
        if !properties.is_empty() {
            host.properties = properties;
        }
        ApiResponse::new(200, Some(json!({ "id": id })))
    }

    fn get_hosts(&self) -> ApiResponse {
        let hosts: Vec<_> = self
            .hosts
            .iter()
            .map(|h| {
                let groups: Vec<String> = h
                    .group_ids
                    .iter()
                    .filter_map(|id| self.path_of(*id))
                    .filter(|p| !p.is_empty())
                    .collect();
                json!({
                    "id": h.id,
                    "hostName": h.host_name,
                    "displayedAs": h.displayed_as,
                    "agentId": h.agent_id.parse::<i64>().ok(),
                    "description": h.description,
                    "properties": { "system.groups": groups.join(",") },
                })
            })
            .collect();
        ApiResponse::new(200, Some(json!({ "total": hosts.len(), "hosts": hosts })))
    }

    fn get_host_properties(&self, params: &RpcParams) -> ApiResponse {
        let id: i64 = params.get("hostId").and_then(|p| p.parse().ok()).unwrap_or(0);
        match self.hosts.iter().find(|h| h.id == id) {
            Some(host) => {
                let props: Vec<_> = host
                    .properties
                    .iter()
                    .map(|(n, v)| json!({ "name": n, "value": v }))
                    .collect();
                ApiResponse::new(200, Some(json!(props)))
            }
            None => ApiResponse::new(1069, None),
        }
    }
}

fn parse_group_ids(params: &RpcParams) -> Vec<i64> {
    params
        .get("hostGroupIds")
        .unwrap_or_default()
        .split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}

fn decode_properties(params: &RpcParams) -> Vec<(String, String)> {
    let mut properties = Vec::new();
    for i in 0.. {
        let Some(name) = params.get(&format!("propName{}", i)) else {
            break;
        };
        let value = params.get(&format!("propValue{}", i)).unwrap_or_default();
        properties.push((name.to_string(), value.to_string()));
    }
    properties
}

#[async_trait]
impl RemoteApi for MockRemoteApi {
    async fn call(&self, action: &str, params: &RpcParams) -> AppResult<ApiResponse> {
        let mut state = self.state.write().unwrap();
        state.calls.push((action.to_string(), params.clone()));

        match &state.error_mode {
            Some(MockError::ConnectionRefused) => {
                return Err(AppError::remote_unavailable("connection refused"));
            }
            Some(MockError::Timeout) => {
                return Err(AppError::RemoteUnavailable {
                    message: "RPC request timed out".to_string(),
                    timed_out: true,
                });
            }
            None => {}
        }

        if let Some(forced) = state.forced.get(action) {
            return Ok(forced.clone());
        }

        let response = match action {
            "getHostGroups" => state.get_host_groups(),
            "addHostGroup" => state.add_host_group(params),
            "addHost" => state.add_host(params),
            "updateHost" => state.update_host(params),
            "getHosts" => state.get_hosts(),
            "getHostProperties" => state.get_host_properties(params),
            _ => ApiResponse::new(404, None),
        };
        Ok(response)
    }
}
