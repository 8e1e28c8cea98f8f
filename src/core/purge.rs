//! Issue purge by filter id, filter name, or single issue key

use serde::Serialize;
use tracing::{info, warn};

use crate::core::error::{SyncError, SyncResult};
use crate::core::filters::{is_filter_id, FilterRegistry};
use crate::core::tracker::Tracker;

/// Separator that marks an identifier as an issue key (`PROJ-123`)
pub const ISSUE_KEY_SEPARATOR: char = '-';

/// What a purge identifier resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PurgeTarget {
    FilterId(String),
    FilterName(String),
    IssueKey(String),
}

impl PurgeTarget {
    /// Classify an identifier without touching the tracker
    pub fn classify(identifier: &str) -> SyncResult<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(SyncError::invalid("filter id, filter name, or issue key is required"));
        }
        Ok(if is_filter_id(identifier) {
            PurgeTarget::FilterId(identifier.to_string())
        } else if !identifier.contains(ISSUE_KEY_SEPARATOR) {
            PurgeTarget::FilterName(identifier.to_string())
        } else {
            PurgeTarget::IssueKey(identifier.to_string())
        })
    }
}

/// Outcome of a purge
#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    pub target: PurgeTarget,
    pub deleted: Vec<String>,
    /// Issue key and the tracker's message for each failed deletion
    pub failed: Vec<(String, String)>,
}

impl PurgeReport {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Turn a report with failures into [`SyncError::PartialFailure`]
    pub fn into_result(self) -> SyncResult<PurgeReport> {
        if self.is_partial() {
            Err(SyncError::PartialFailure {
                succeeded: self.deleted.len(),
                failed: self.failed,
            })
        } else {
            Ok(self)
        }
    }

    pub fn summary(&self) -> String {
        match &self.target {
            PurgeTarget::IssueKey(key) => format!("Issue {} deleted", key),
            _ if self.failed.is_empty() => format!("All issues deleted ({})", self.deleted.len()),
            _ => format!(
                "{} issue(s) deleted, {} failed",
                self.deleted.len(),
                self.failed.len()
            ),
        }
    }
}

pub struct PurgeOrchestrator<'a> {
    tracker: &'a dyn Tracker,
    max_results: u32,
}

impl<'a> PurgeOrchestrator<'a> {
    pub fn new(tracker: &'a dyn Tracker, max_results: u32) -> Self {
        Self {
            tracker,
            max_results,
        }
    }

    pub fn purge(&self, identifier: &str) -> SyncResult<PurgeReport> {
        let target = PurgeTarget::classify(identifier)?;

        let query = match &target {
            PurgeTarget::IssueKey(key) => {
                self.tracker.delete_issue(key).map_err(|e| {
                    if e.is_remote_not_found() {
                        SyncError::not_found("Issue", key.as_str())
                    } else {
                        e
                    }
                })?;
                info!(key = %key, "deleted issue");
                return Ok(PurgeReport {
                    deleted: vec![key.clone()],
                    failed: Vec::new(),
                    target,
                });
            }
            PurgeTarget::FilterId(id) | PurgeTarget::FilterName(id) => {
                FilterRegistry::new(self.tracker).resolve(id)?
            }
        };

        let issues = self
            .tracker
            .search(&query.query_text, self.max_results, &["key"])?;
        info!(filter = %query.name, id = %query.id, count = issues.len(), "purging filter results");

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for issue in issues {
            match self.tracker.delete_issue(&issue.key) {
                Ok(()) => deleted.push(issue.key),
                Err(err) => {
                    warn!(key = %issue.key, error = %err, "failed to delete issue");
                    failed.push((issue.key, err.to_string()));
                }
            }
        }

        Ok(PurgeReport {
            target,
            deleted,
            failed,
        })
    }
}
