//! Issue tracker access
//!
//! The [`Tracker`] trait is the seam between the sync core and the remote
//! issue tracker. [`TrackerClient`] implements it over the Jira Cloud REST v3
//! API; tests substitute an in-memory tracker.
//!
//! Every call is attempted exactly once. Non-2xx answers surface as
//! [`SyncError::RemoteRejected`](crate::core::SyncError::RemoteRejected)
//! carrying the status and the body verbatim.

mod client;
#[cfg(test)]
pub(crate) mod fake;
mod types;

pub use client::TrackerClient;

use clap::ValueEnum;
use serde::Serialize;

use crate::core::error::SyncResult;

/// A named, persisted search expression on the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedQuery {
    pub id: String,
    pub name: String,
    pub query_text: String,
    pub description: String,
}

/// Scope of a permission grant attached to a saved query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeType {
    Project,
    ProjectRole,
    User,
    Group,
    Global,
    /// Any scope type this crate does not manage (e.g. `loggedin`)
    Other(String),
}

impl ScopeType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "project" => ScopeType::Project,
            "projectRole" => ScopeType::ProjectRole,
            "user" => ScopeType::User,
            "group" => ScopeType::Group,
            "global" => ScopeType::Global,
            other => ScopeType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ScopeType::Project => "project",
            ScopeType::ProjectRole => "projectRole",
            ScopeType::User => "user",
            ScopeType::Group => "group",
            ScopeType::Global => "global",
            ScopeType::Other(raw) => raw,
        }
    }

    /// Scope types removed by a revoke-all
    pub fn is_managed(&self) -> bool {
        !matches!(self, ScopeType::Other(_))
    }
}

impl Serialize for ScopeType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for ScopeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An access-control entry on a saved query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionGrant {
    pub id: String,
    pub scope_type: ScopeType,
    pub project_id: Option<String>,
    pub role_id: Option<String>,
    pub can_view: bool,
    pub can_edit: bool,
}

/// Access level granted to a project role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    #[default]
    Viewer,
    Editor,
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleKind::Viewer => write!(f, "viewer"),
            RoleKind::Editor => write!(f, "editor"),
        }
    }
}

/// A project-role grant to be created on a saved query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGrant {
    pub project_id: String,
    pub role_id: String,
    pub kind: RoleKind,
}

/// An issue as returned by a tracker search, before label classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueRecord {
    pub key: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub resolution: Option<String>,
    pub labels: Vec<String>,
}

/// Fields requested when mirroring issues into the snapshot
pub const SNAPSHOT_FIELDS: &[&str] = &["summary", "status", "duedate", "resolution", "labels"];

/// Operations the sync core needs from the issue tracker
pub trait Tracker: Send + Sync {
    /// Run a JQL search, truncated at `max_results` (no pagination)
    fn search(&self, jql: &str, max_results: u32, fields: &[&str]) -> SyncResult<Vec<IssueRecord>>;

    fn get_filter(&self, id: &str) -> SyncResult<SavedQuery>;

    /// Exact, case-sensitive lookup by filter name
    fn find_filter_by_name(&self, name: &str) -> SyncResult<Option<SavedQuery>>;

    /// Create a filter and return its id
    fn create_filter(&self, name: &str, jql: &str, description: &str) -> SyncResult<String>;

    fn update_filter(&self, id: &str, jql: &str) -> SyncResult<()>;

    fn delete_issue(&self, key: &str) -> SyncResult<()>;

    fn list_permissions(&self, filter_id: &str) -> SyncResult<Vec<PermissionGrant>>;

    fn add_permission(&self, filter_id: &str, grant: &NewGrant) -> SyncResult<()>;

    fn delete_permission(&self, filter_id: &str, grant_id: &str) -> SyncResult<()>;

    fn get_project_id(&self, project_key: &str) -> SyncResult<String>;

    /// Case-insensitive role lookup within a project
    fn get_project_role_id(&self, project_key: &str, role_name: &str) -> SyncResult<Option<String>>;

    fn list_project_role_names(&self, project_key: &str) -> SyncResult<Vec<String>>;

    fn list_project_keys(&self) -> SyncResult<Vec<String>>;

    /// Distinct workflow status names used by the project
    fn list_project_statuses(&self, project_key: &str) -> SyncResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_type_parse_roundtrip() {
        for raw in ["project", "projectRole", "user", "group", "global"] {
            let scope = ScopeType::parse(raw);
            assert!(scope.is_managed());
            assert_eq!(scope.as_str(), raw);
        }
    }

    #[test]
    fn test_unknown_scope_is_not_managed() {
        let scope = ScopeType::parse("loggedin");
        assert_eq!(scope, ScopeType::Other("loggedin".to_string()));
        assert!(!scope.is_managed());
    }
}
