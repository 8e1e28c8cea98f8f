//! Build a snapshot from the category saved queries

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::{Category, Snapshot, SnapshotRow, SnapshotStore};
use crate::core::error::SyncResult;
use crate::core::filters::FilterRegistry;
use crate::core::labels::LabelClassifier;
use crate::core::tracker::{Tracker, SNAPSHOT_FIELDS};

/// Statuses that make an issue count as unresolved for the Unresolved category
pub const UNRESOLVED_STATUSES: &[&str] = &["To Do", "In Progress"];

/// Name of the auto-created filter for a category
pub fn category_filter_name(category: Category) -> String {
    format!("overall_status_filter_{}", category.as_str())
}

/// Statistics from a snapshot build
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    pub rows: BTreeMap<Category, usize>,
    pub duration_ms: u64,
    pub fingerprint: String,
}

impl BuildStats {
    pub fn total_rows(&self) -> usize {
        self.rows.values().sum()
    }
}

pub struct SnapshotBuilder<'a> {
    tracker: &'a dyn Tracker,
    classifier: LabelClassifier,
    max_results: u32,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(tracker: &'a dyn Tracker, classifier: LabelClassifier, max_results: u32) -> Self {
        Self {
            tracker,
            classifier,
            max_results,
        }
    }

    /// Run every category's filter and assemble the snapshot in memory.
    /// Any tracker error aborts the whole collection.
    pub fn collect(&self, category_filters: &BTreeMap<Category, String>) -> SyncResult<Snapshot> {
        let mut rows = Vec::new();
        for (&category, filter_id) in category_filters {
            let filter = self.tracker.get_filter(filter_id)?;
            let issues = self
                .tracker
                .search(&filter.query_text, self.max_results, SNAPSHOT_FIELDS)?;
            info!(%category, filter = %filter.name, count = issues.len(), "fetched category issues");

            rows.extend(issues.into_iter().map(|issue| {
                SnapshotRow::from_issue(issue, &filter.name, category, &self.classifier)
            }));
        }
        Ok(Snapshot::from_rows(rows, Some(Utc::now())))
    }

    /// Collect and persist the snapshot, replacing any previous one atomically
    pub fn build(&self, category_filters: &BTreeMap<Category, String>, store: &SnapshotStore) -> SyncResult<BuildStats> {
        let start = Instant::now();
        let snapshot = self.collect(category_filters)?;
        store.write(&snapshot)?;

        let mut rows: BTreeMap<Category, usize> = category_filters.keys().map(|&c| (c, 0)).collect();
        for row in snapshot.merged.iter().chain(&snapshot.unresolved) {
            *rows.entry(row.category).or_default() += 1;
        }

        let stats = BuildStats {
            rows,
            duration_ms: start.elapsed().as_millis() as u64,
            fingerprint: snapshot.fingerprint(),
        };
        info!(
            path = %store.path().display(),
            rows = stats.total_rows(),
            duration_ms = stats.duration_ms,
            "snapshot built"
        );
        Ok(stats)
    }

    /// Make sure the category filters exist for a project, creating missing ones.
    ///
    /// Pass and Fail are only set up when the project's workflow has a status of
    /// that name; Unresolved covers whichever of [`UNRESOLVED_STATUSES`] exist.
    /// Existing filters are returned as they are.
    pub fn ensure_category_filters(&self, project_key: &str) -> SyncResult<BTreeMap<Category, String>> {
        let statuses = self.tracker.list_project_statuses(project_key)?;
        let has_status = |name: &str| statuses.iter().any(|s| s == name);
        let registry = FilterRegistry::new(self.tracker);
        let project_clause = format!("project = \"{}\"", project_key);

        let mut filter_ids = BTreeMap::new();

        let id = registry.ensure_exists(
            &category_filter_name(Category::Target),
            &project_clause,
            "Auto-created filter for all issues (Target)",
        )?;
        filter_ids.insert(Category::Target, id);

        for category in [Category::Pass, Category::Fail] {
            let status = category.as_str();
            if !has_status(status) {
                warn!(project_key, status, "status not found in project, skipping category");
                continue;
            }
            let id = registry.ensure_exists(
                &category_filter_name(category),
                &format!("{} AND status = \"{}\"", project_clause, status),
                &format!("Auto-created filter for status '{}'", status),
            )?;
            filter_ids.insert(category, id);
        }

        let unresolved: Vec<&str> = UNRESOLVED_STATUSES
            .iter()
            .copied()
            .filter(|s| has_status(s))
            .collect();
        if unresolved.is_empty() {
            warn!(project_key, "no unresolved statuses found in project, skipping category");
        } else {
            let clause = unresolved
                .iter()
                .map(|s| format!("status = \"{}\"", s))
                .collect::<Vec<_>>()
                .join(" OR ");
            let id = registry.ensure_exists(
                &category_filter_name(Category::Unresolved),
                &format!("{} AND ({})", project_clause, clause),
                &format!(
                    "Auto-created filter for unresolved statuses: {}",
                    unresolved.join(", ")
                ),
            )?;
            filter_ids.insert(Category::Unresolved, id);
        }

        Ok(filter_ids)
    }
}
