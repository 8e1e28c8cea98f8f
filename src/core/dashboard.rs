//! In-process facade over the sync and aggregation core
//!
//! Every caller-facing operation goes through [`Dashboard`]. The tracker client
//! is only built when an operation needs it, so snapshot queries work offline.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::core::aggregate::{AggregationService, CaseRow, PlatformSummary, SnapshotCache};
use crate::core::config::Config;
use crate::core::error::{SyncError, SyncResult};
use crate::core::filters::FilterRegistry;
use crate::core::permissions::PermissionManager;
use crate::core::purge::{PurgeOrchestrator, PurgeReport, PurgeTarget};
use crate::core::snapshot::{BuildStats, Category, Snapshot, SnapshotBuilder, SnapshotStore};
use crate::core::tracker::{PermissionGrant, RoleKind, SavedQuery, Tracker, TrackerClient};

/// `{status, message}` envelope for user-visible outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse {
    pub status: &'static str,
    pub message: String,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }

    /// The error's display text, which keeps the tracker's body verbatim
    pub fn error(err: &SyncError) -> Self {
        Self {
            status: "error",
            message: err.to_string(),
        }
    }

    pub fn from_result<T>(result: &SyncResult<T>, message: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(value) => Self::success(message(value)),
            Err(err) => Self::error(err),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// State of the snapshot file
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStatus {
    pub path: PathBuf,
    pub available: bool,
    pub built_at: Option<DateTime<Utc>>,
    pub rows: BTreeMap<Category, usize>,
    pub fingerprint: Option<String>,
}

pub struct Dashboard {
    config: Config,
    tracker: OnceLock<Box<dyn Tracker>>,
    store: SnapshotStore,
    cache: SnapshotCache,
}

impl Dashboard {
    pub fn new(config: Config) -> Self {
        let store = SnapshotStore::new(config.snapshot_path());
        Self {
            config,
            tracker: OnceLock::new(),
            store,
            cache: SnapshotCache::new(),
        }
    }

    /// Use a specific tracker instead of building one from the config
    pub fn with_tracker(config: Config, tracker: Box<dyn Tracker>) -> Self {
        let dashboard = Self::new(config);
        let _ = dashboard.tracker.set(tracker);
        dashboard
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    fn tracker(&self) -> SyncResult<&dyn Tracker> {
        if let Some(tracker) = self.tracker.get() {
            return Ok(tracker.as_ref());
        }
        let client = TrackerClient::from_config(&self.config)?;
        Ok(self.tracker.get_or_init(|| Box::new(client)).as_ref())
    }

    fn aggregation(&self) -> AggregationService<'_> {
        AggregationService::new(&self.store, &self.cache)
    }

    fn permissions(&self) -> SyncResult<PermissionManager<'_>> {
        Ok(PermissionManager::new(self.tracker()?)
            .with_max_revoke_iterations(self.config.max_revoke_iterations()))
    }

    // Serving

    pub fn snapshot(&self) -> SyncResult<Arc<Snapshot>> {
        self.aggregation().load()
    }

    pub fn get_platform_summary(&self, platform: &str) -> SyncResult<Vec<PlatformSummary>> {
        self.aggregation().query_by_platform(platform)
    }

    pub fn get_cases(&self, interface: &str, status: &str, platform: Option<&str>) -> SyncResult<Vec<CaseRow>> {
        self.aggregation().query_cases(interface, status, platform)
    }

    pub fn get_interface_cases(&self, interface: &str, platform: Option<&str>) -> SyncResult<Vec<CaseRow>> {
        self.aggregation().interface_cases(interface, platform)
    }

    pub fn get_merged_unresolved_cases(&self, interface: &str, platform: Option<&str>) -> SyncResult<Vec<CaseRow>> {
        self.aggregation().merged_unresolved_cases(interface, platform)
    }

    pub fn snapshot_status(&self) -> SyncResult<SnapshotStatus> {
        let path = self.store.path().to_path_buf();
        let snapshot = match self.store.read() {
            Ok(snapshot) => snapshot,
            Err(SyncError::SourceUnavailable { .. }) => {
                return Ok(SnapshotStatus {
                    path,
                    available: false,
                    built_at: None,
                    rows: BTreeMap::new(),
                    fingerprint: None,
                })
            }
            Err(err) => return Err(err),
        };
        let rows = Category::ALL
            .into_iter()
            .map(|c| (c, snapshot.sheet(c).count()))
            .collect();
        Ok(SnapshotStatus {
            path,
            available: true,
            built_at: snapshot.built_at,
            rows,
            fingerprint: Some(snapshot.fingerprint()),
        })
    }

    // Synchronization

    /// Rebuild the snapshot from the category filters and reload the cache
    pub fn refresh_snapshot(&self) -> SyncResult<BuildStats> {
        let tracker = self.tracker()?;
        let builder = SnapshotBuilder::new(tracker, self.config.classifier(), self.config.max_results());

        let category_filters = match &self.config.category_filters {
            Some(filters) if !filters.is_empty() => filters.clone(),
            _ => {
                let project_key = self.config.project_key.as_deref().ok_or_else(|| SyncError::Config {
                    message: "no category_filters configured and no project_key to create them for".to_string(),
                })?;
                builder.ensure_category_filters(project_key)?
            }
        };

        let stats = builder.build(&category_filters, &self.store)?;
        self.aggregation().load()?;
        Ok(stats)
    }

    pub fn ensure_category_filters(&self, project_key: &str) -> SyncResult<BTreeMap<Category, String>> {
        SnapshotBuilder::new(self.tracker()?, self.config.classifier(), self.config.max_results())
            .ensure_category_filters(project_key)
    }

    // Administration

    pub fn create_or_update_filter(&self, name: &str, jql: &str) -> SyncResult<SavedQuery> {
        FilterRegistry::new(self.tracker()?).create_or_update(name, jql)
    }

    pub fn show_filter(&self, identifier: &str) -> SyncResult<SavedQuery> {
        FilterRegistry::new(self.tracker()?).resolve(identifier)
    }

    /// Delete one issue, or every issue a filter returns
    pub fn delete_by_identifier(&self, identifier: &str) -> SyncResult<PurgeReport> {
        // Reject bad input before requiring credentials
        PurgeTarget::classify(identifier)?;
        let report = PurgeOrchestrator::new(self.tracker()?, self.config.max_results()).purge(identifier)?;
        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "purge finished"
        );
        Ok(report)
    }

    pub fn list_roles(&self, filter_id: &str) -> SyncResult<Vec<PermissionGrant>> {
        self.permissions()?.list(filter_id)
    }

    pub fn grant_role(&self, filter_id: &str, project_key: &str, role_name: &str, kind: RoleKind) -> SyncResult<()> {
        self.permissions()?
            .add_role(filter_id, project_key, role_name, kind)
    }

    pub fn revoke_role(&self, filter_id: &str, project_key: &str, role_name: &str, kind: RoleKind) -> SyncResult<bool> {
        self.permissions()?
            .remove_role(filter_id, project_key, role_name, kind)
    }

    pub fn revoke_all_roles(&self, filter_id: &str) -> SyncResult<usize> {
        self.permissions()?.remove_all(filter_id)
    }

    pub fn project_roles(&self, project_key: &str) -> SyncResult<Vec<String>> {
        self.tracker()?.list_project_role_names(project_key)
    }

    pub fn project_keys(&self) -> SyncResult<Vec<String>> {
        self.tracker()?.list_project_keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tracker::fake::FakeTracker;
    use crate::core::tracker::IssueRecord;
    use tempfile::{tempdir, TempDir};

    fn config(tmp: &TempDir) -> Config {
        Config {
            snapshot_path: Some(tmp.path().join("snapshot.db")),
            project_key: Some("DS".to_string()),
            ..Config::default()
        }
    }

    fn issue(key: &str, labels: &[&str], status: &str, resolution: Option<&str>) -> IssueRecord {
        IssueRecord {
            key: key.to_string(),
            summary: Some(format!("{} summary", key)),
            status: Some(status.to_string()),
            due_date: None,
            resolution: resolution.map(str::to_string),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn seeded_tracker() -> FakeTracker {
        FakeTracker::new()
            .with_project("DS", "10001", &[("Developers", "10003")], &["To Do", "Pass", "Fail"])
            .with_issue(issue("DS-1", &["SVB", "UART"], "Pass", Some("Done")))
            .with_issue(issue("DS-2", &["SVB", "UART"], "To Do", None))
            .with_issue(issue("DS-3", &["SVB", "SPI", "FAIL"], "Fail", Some("Done")))
            .with_search("project = \"DS\"", &["DS-1", "DS-2", "DS-3"])
            .with_search("project = \"DS\" AND status = \"Pass\"", &["DS-1"])
            .with_search("project = \"DS\" AND status = \"Fail\"", &["DS-3"])
            .with_search("project = \"DS\" AND (status = \"To Do\")", &["DS-2"])
    }

    #[test]
    fn test_refresh_then_serve() {
        let tmp = tempdir().unwrap();
        let dashboard = Dashboard::with_tracker(config(&tmp), Box::new(seeded_tracker()));

        let stats = dashboard.refresh_snapshot().unwrap();
        assert_eq!(stats.total_rows(), 6);

        let summary = dashboard.get_platform_summary("SVB").unwrap();
        assert_eq!(
            summary,
            vec![
                PlatformSummary {
                    interface: "SPI".to_string(),
                    target_count: 1,
                    pass_count: 0,
                    fail_count: 1,
                    unresolved_count: 0,
                },
                PlatformSummary {
                    interface: "UART".to_string(),
                    target_count: 2,
                    pass_count: 1,
                    fail_count: 0,
                    unresolved_count: 1,
                },
            ]
        );

        let cases = dashboard.get_cases("uart", "unresolved", Some("SVB")).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].summary_text, "DS-2 summary");
        assert_eq!(cases[0].status_text, "To Do");

        let status = dashboard.snapshot_status().unwrap();
        assert!(status.available);
        assert!(status.built_at.is_some());
        assert_eq!(status.rows[&Category::Target], 3);
    }

    #[test]
    fn test_refresh_failure_keeps_serving_previous_snapshot() {
        let tmp = tempdir().unwrap();
        let dashboard = Dashboard::with_tracker(config(&tmp), Box::new(seeded_tracker()));
        dashboard.refresh_snapshot().unwrap();
        let before = dashboard.snapshot().unwrap();

        let broken = Config {
            category_filters: Some(BTreeMap::from([(Category::Target, "999".to_string())])),
            ..config(&tmp)
        };
        let dashboard = Dashboard::with_tracker(broken, Box::new(seeded_tracker()));
        assert!(dashboard.refresh_snapshot().is_err());
        assert_eq!(dashboard.snapshot().unwrap().fingerprint(), before.fingerprint());
    }

    #[test]
    fn test_offline_queries_need_no_credentials() {
        let tmp = tempdir().unwrap();
        let dashboard = Dashboard::new(config(&tmp));

        let err = dashboard.get_platform_summary("SVB").unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable { .. }));
        assert!(!dashboard.snapshot_status().unwrap().available);

        let err = dashboard.project_keys().unwrap_err();
        assert!(matches!(err, SyncError::Config { .. }));
    }

    #[test]
    fn test_refresh_without_project_is_config_error() {
        let tmp = tempdir().unwrap();
        let config = Config {
            project_key: None,
            ..config(&tmp)
        };
        let dashboard = Dashboard::with_tracker(config, Box::new(FakeTracker::new()));
        assert!(matches!(
            dashboard.refresh_snapshot().unwrap_err(),
            SyncError::Config { .. }
        ));
    }

    #[test]
    fn test_delete_rejects_empty_identifier_before_connecting() {
        let tmp = tempdir().unwrap();
        let dashboard = Dashboard::new(config(&tmp));
        assert!(matches!(
            dashboard.delete_by_identifier("  ").unwrap_err(),
            SyncError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_role_round_trip_through_facade() {
        let tmp = tempdir().unwrap();
        let dashboard = Dashboard::with_tracker(
            config(&tmp),
            Box::new(seeded_tracker().with_filter("10231", "Temp2", "project = DS")),
        );

        dashboard
            .grant_role("10231", "DS", "developers", RoleKind::Viewer)
            .unwrap();
        assert_eq!(dashboard.list_roles("10231").unwrap().len(), 1);
        assert!(dashboard
            .revoke_role("10231", "DS", "Developers", RoleKind::Viewer)
            .unwrap());
        assert_eq!(dashboard.revoke_all_roles("10231").unwrap(), 0);
        assert_eq!(dashboard.project_roles("DS").unwrap(), vec!["Developers"]);
    }

    #[test]
    fn test_api_response_keeps_remote_message() {
        let result: SyncResult<()> = Err(SyncError::RemoteRejected {
            status: 400,
            body: "The value 'XYZ' does not exist for the field 'project'.".to_string(),
        });
        let response = ApiResponse::from_result(&result, |_| "Filter created/updated!".to_string());
        assert!(!response.is_success());
        assert!(response.message.contains("The value 'XYZ' does not exist"));

        let ok = ApiResponse::from_result(&Ok(3usize), |n| format!("{} removed", n));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"status": "success", "message": "3 removed"})
        );
    }
}
