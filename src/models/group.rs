//! Host group data model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::PropertySet;
use crate::utils::validation::validate_group_name;
use crate::utils::{AppError, AppResult};

/// Identifier of the implicit root group
pub const ROOT_GROUP_ID: i64 = 1;

/// A `/`-delimited position in the group tree
///
/// The empty path is the root group. Segments are never empty and carry no
/// surrounding whitespace; one leading and one trailing `/` are stripped while
/// parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupPath {
    segments: Vec<String>,
}

impl GroupPath {
    /// The root group path
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path such as `/Linux/Web Servers`
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = trimmed.split('/').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(|s| !validate_group_name(s)) {
            return Err(AppError::Validation(format!(
                "Invalid group path '{}': path segments must not be empty",
                raw
            )));
        }

        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<GroupPath> {
        if self.is_root() {
            None
        } else {
            Some(self.prefix(self.segments.len() - 1))
        }
    }

    /// The path made of the first `len` segments
    pub fn prefix(&self, len: usize) -> GroupPath {
        GroupPath {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Append one segment
    pub fn child(&self, name: &str) -> AppResult<GroupPath> {
        let name = name.trim();
        if !validate_group_name(name) {
            return Err(AppError::Validation(format!(
                "Invalid group name '{}'",
                name
            )));
        }
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(GroupPath { segments })
    }

    /// Full path as the API reports it (`a/b`, no leading slash)
    pub fn full_path(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.full_path())
    }
}

impl FromStr for GroupPath {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupPath::parse(s)
    }
}

/// A host group as returned by the group listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: i64,

    /// Full path without leading slash (empty for the root)
    #[serde(default)]
    pub full_path: String,

    #[serde(default)]
    pub parent_id: Option<i64>,

    /// Membership expression of dynamic groups
    #[serde(default)]
    pub applies_to: Option<String>,
}

impl GroupRecord {
    /// Record of a group created during the run with `spec`
    pub fn created(path: &GroupPath, id: i64, parent_id: i64, spec: &GroupSpec) -> Self {
        Self {
            id,
            full_path: path.full_path(),
            parent_id: Some(parent_id),
            applies_to: if spec.dynamic {
                spec.applies_to.clone()
            } else {
                None
            },
        }
    }

    /// Dynamic groups compute membership from `appliesTo`
    pub fn is_dynamic(&self) -> bool {
        self.applies_to
            .as_deref()
            .map(|expr| !expr.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Attributes applied to a group created by path resolution
///
/// Only the leaf of a resolved path receives the spec; missing ancestors are
/// created as plain static groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSpec {
    pub dynamic: bool,
    pub applies_to: Option<String>,
    pub description: Option<String>,
    pub properties: PropertySet,
}

impl GroupSpec {
    /// A dynamic group with the given membership expression
    pub fn dynamic(applies_to: impl Into<String>) -> Self {
        Self {
            dynamic: true,
            applies_to: Some(applies_to.into()),
            ..Default::default()
        }
    }
}

/// One row of a group definition CSV
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupDefinition {
    /// 1-based line in the source file
    pub line: u64,
    pub name: Option<String>,
    /// Parent path the group is created under (`/` for the root)
    pub parent_path: Option<String>,
    pub applies_to: Option<String>,
    pub description: Option<String>,
    pub properties: Option<String>,
}

impl GroupDefinition {
    /// Check required fields and compute the full path of the group
    pub fn target_path(&self) -> AppResult<GroupPath> {
        let name = self.name.as_deref().ok_or_else(|| {
            AppError::Validation(format!("Line {}: groupname is required", self.line))
        })?;
        let parent = self.parent_path.as_deref().ok_or_else(|| {
            AppError::Validation(format!("Line {}: grouppath is required", self.line))
        })?;
        if !parent.trim_start().starts_with('/') {
            return Err(AppError::Validation(format!(
                "Line {}: group path '{}' must begin with '/'",
                self.line, parent
            )));
        }

        GroupPath::parse(parent)?.child(name)
    }

    /// Leaf attributes: non-empty `appliesTo` makes the group dynamic
    pub fn spec(&self) -> GroupSpec {
        let applies_to = self
            .applies_to
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        GroupSpec {
            dynamic: applies_to.is_some(),
            applies_to,
            description: self.description.clone(),
            properties: PropertySet::decode(self.properties.as_deref()),
        }
    }
}
