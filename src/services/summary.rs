//! Per-run outcome accounting

use std::fmt;

use serde::Serialize;

use crate::services::rpc::{ApiResponse, STATUS_DUPLICATE, STATUS_OK};

/// Classification of one processed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Created,
    Duplicate,
    Failed,
}

impl OutcomeKind {
    /// `200` is created, `600` is duplicate, anything else failed
    pub fn from_status(status: i64) -> Self {
        match status {
            STATUS_OK => OutcomeKind::Created,
            STATUS_DUPLICATE => OutcomeKind::Duplicate,
            _ => OutcomeKind::Failed,
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeKind::Created => "created",
            OutcomeKind::Duplicate => "duplicate",
            OutcomeKind::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Outcome of one record with the response text that decided it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub kind: OutcomeKind,
    pub response: String,
}

impl UploadOutcome {
    pub fn from_response(response: &ApiResponse) -> Self {
        Self {
            kind: OutcomeKind::from_status(response.status),
            response: response.raw.clone(),
        }
    }

    /// A failure that happened before or instead of the remote call
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Failed,
            response: reason.into(),
        }
    }

    pub fn duplicate(reason: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Duplicate,
            response: reason.into(),
        }
    }
}

/// Append-only tally of a bulk run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    title: String,
    attempted: usize,
    created: Vec<String>,
    duplicate: Vec<String>,
    failed: Vec<String>,
    /// Rows rejected by validation; not counted as attempted
    skipped: Vec<String>,
}

impl RunSummary {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Count an attempted record under its outcome
    pub fn record(&mut self, outcome: &UploadOutcome, name: impl Into<String>) {
        self.attempted += 1;
        let name = name.into();
        match outcome.kind {
            OutcomeKind::Created => self.created.push(name),
            OutcomeKind::Duplicate => self.duplicate.push(name),
            OutcomeKind::Failed => self.failed.push(name),
        }
    }

    /// List a row that never reached the remote call
    pub fn skip(&mut self, name: impl Into<String>) {
        self.skipped.push(name.into());
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn created(&self) -> &[String] {
        &self.created
    }

    pub fn duplicate(&self) -> &[String] {
        &self.duplicate
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Final report text
    pub fn render(&self) -> String {
        let mut out = format!("------------------ {} ------------------\n", self.title);
        out.push_str(&format!("Attempted: {}\n", self.attempted));
        for (label, names) in [
            ("Created", &self.created),
            ("Duplicate (already present)", &self.duplicate),
            ("Failed", &self.failed),
            ("Skipped (invalid rows)", &self.skipped),
        ] {
            out.push_str(&format!("{}: {}\n", label, names.len()));
            if !names.is_empty() {
                out.push_str(&format!("  {}\n", names.join(", ")));
            }
        }
        out
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
