//! Tabular snapshot of tracker issues
//!
//! A snapshot has one sheet per [`Category`]. The Target, Pass and Fail sheets
//! are merged into one working table because they are aggregated together;
//! the Unresolved sheet is kept apart because it is queried independently.
//!
//! Persistence lives in [`store`], collection from the tracker in [`builder`].

pub mod builder;
pub mod store;

pub use builder::{category_filter_name, BuildStats, SnapshotBuilder};
pub use store::SnapshotStore;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::labels::LabelClassifier;
use crate::core::tracker::IssueRecord;

/// Due date shown for issues without one
pub const NO_DUE_DATE: &str = "Not Set";

/// Resolution shown for issues the tracker reports as unresolved
pub const UNRESOLVED: &str = "Unresolved";

/// The semantic bucket a saved query represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Category {
    Target,
    Pass,
    Fail,
    Unresolved,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Target,
        Category::Pass,
        Category::Fail,
        Category::Unresolved,
    ];

    /// Also the sheet (table) name in the persisted snapshot
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Target => "Target",
            Category::Pass => "Pass",
            Category::Fail => "Fail",
            Category::Unresolved => "Unresolved",
        }
    }

    /// Whether rows of this category belong to the merged working table
    pub fn is_merged(&self) -> bool {
        !matches!(self, Category::Unresolved)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// One issue as mirrored into the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRow {
    pub issue_key: String,
    /// Name of the saved query that produced the row
    pub filter: String,
    pub summary: String,
    pub platform: String,
    pub interface_id: String,
    pub status: String,
    pub due_date: String,
    pub resolution: String,
    pub category: Category,
}

impl SnapshotRow {
    pub fn from_issue(
        issue: IssueRecord,
        filter_name: &str,
        category: Category,
        classifier: &LabelClassifier,
    ) -> Self {
        let labels = classifier.classify(&issue.labels);
        if !labels.extra_candidates.is_empty() {
            tracing::debug!(
                key = %issue.key,
                picked = %labels.interface_id,
                ignored = ?labels.extra_candidates,
                "issue has several interface labels"
            );
        }
        SnapshotRow {
            issue_key: issue.key,
            filter: filter_name.to_string(),
            summary: issue.summary.unwrap_or_default(),
            platform: labels.platform,
            interface_id: labels.interface_id,
            status: issue.status.unwrap_or_default(),
            due_date: issue
                .due_date
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| NO_DUE_DATE.to_string()),
            resolution: issue.resolution.unwrap_or_else(|| UNRESOLVED.to_string()),
            category,
        }
    }
}

/// The merged and unresolved tables plus build metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Target, Pass and Fail rows in that order
    pub merged: Vec<SnapshotRow>,
    pub unresolved: Vec<SnapshotRow>,
    pub built_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Assemble a snapshot from rows of any category
    pub fn from_rows(rows: impl IntoIterator<Item = SnapshotRow>, built_at: Option<DateTime<Utc>>) -> Self {
        let (mut merged, unresolved): (Vec<_>, Vec<_>) =
            rows.into_iter().partition(|r| r.category.is_merged());
        // Stable: keeps tracker order within a category
        merged.sort_by_key(|r| r.category);
        Snapshot {
            merged,
            unresolved,
            built_at,
        }
    }

    /// Rows of one sheet
    pub fn sheet(&self, category: Category) -> impl Iterator<Item = &SnapshotRow> {
        let table = if category.is_merged() {
            &self.merged
        } else {
            &self.unresolved
        };
        table.iter().filter(move |r| r.category == category)
    }

    pub fn row_count(&self) -> usize {
        self.merged.len() + self.unresolved.len()
    }

    /// SHA-256 over every row, in order. Equal fingerprints mean equal tables.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for row in self.merged.iter().chain(&self.unresolved) {
            for field in [
                row.category.as_str(),
                row.issue_key.as_str(),
                row.filter.as_str(),
                row.summary.as_str(),
                row.platform.as_str(),
                row.interface_id.as_str(),
                row.status.as_str(),
                row.due_date.as_str(),
                row.resolution.as_str(),
            ] {
                hasher.update(field.as_bytes());
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn row(category: Category, key: &str, platform: &str, ip: &str) -> SnapshotRow {
        SnapshotRow {
            issue_key: key.to_string(),
            filter: format!("overall_status_filter_{}", category),
            summary: format!("{} summary", key),
            platform: platform.to_string(),
            interface_id: ip.to_string(),
            status: category.to_string(),
            due_date: NO_DUE_DATE.to_string(),
            resolution: if category == Category::Pass || category == Category::Fail {
                "Done".to_string()
            } else {
                UNRESOLVED.to_string()
            },
            category,
        }
    }
}
