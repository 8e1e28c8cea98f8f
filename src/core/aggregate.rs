//! Read-through snapshot cache and the dashboard aggregations
//!
//! [`SnapshotCache`] keeps the last snapshot that loaded successfully. When the
//! durable snapshot is missing, locked, or not readable, [`AggregationService::load`]
//! serves the cached copy instead of failing; corrupt data is always reported.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::error::{SyncError, SyncResult};
use crate::core::snapshot::{Category, Snapshot, SnapshotRow, SnapshotStore, UNRESOLVED};

/// Last successfully loaded snapshot
#[derive(Debug, Default)]
pub struct SnapshotCache {
    slot: Mutex<Option<Arc<Snapshot>>>,
    reload: Mutex<()>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<Snapshot>> {
        lock(&self.slot).clone()
    }

    /// Replace the cached snapshot, returning the new shared copy
    pub fn swap(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *lock(&self.slot) = Some(Arc::clone(&snapshot));
        snapshot
    }

    fn reload_guard(&self) -> MutexGuard<'_, ()> {
        lock(&self.reload)
    }
}

// A panic while holding the slot cannot leave it half-written
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counts for one interface on a platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformSummary {
    #[serde(rename = "Interface")]
    pub interface: String,
    #[serde(rename = "Target")]
    pub target_count: usize,
    #[serde(rename = "Pass")]
    pub pass_count: usize,
    #[serde(rename = "Fail")]
    pub fail_count: usize,
    #[serde(rename = "Unresolved")]
    pub unresolved_count: usize,
}

impl PlatformSummary {
    fn new(interface: &str) -> Self {
        Self {
            interface: interface.to_string(),
            target_count: 0,
            pass_count: 0,
            fail_count: 0,
            unresolved_count: 0,
        }
    }
}

/// One line of a case list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseRow {
    #[serde(rename = "no")]
    pub sequence_number: usize,
    #[serde(rename = "details")]
    pub summary_text: String,
    #[serde(rename = "status")]
    pub status_text: String,
}

pub struct AggregationService<'a> {
    store: &'a SnapshotStore,
    cache: &'a SnapshotCache,
}

impl<'a> AggregationService<'a> {
    pub fn new(store: &'a SnapshotStore, cache: &'a SnapshotCache) -> Self {
        Self { store, cache }
    }

    /// Read the durable snapshot, falling back to the cached one when the source is unavailable
    pub fn load(&self) -> SyncResult<Arc<Snapshot>> {
        let _reload = self.cache.reload_guard();
        match self.store.read() {
            Ok(snapshot) => {
                debug!(rows = snapshot.row_count(), "snapshot loaded");
                Ok(self.cache.swap(snapshot))
            }
            Err(SyncError::SourceUnavailable { message }) => match self.cache.get() {
                Some(cached) => {
                    warn!(reason = %message, "snapshot unavailable, serving cached copy");
                    Ok(cached)
                }
                None => Err(SyncError::SourceUnavailable { message }),
            },
            Err(err) => Err(err),
        }
    }

    pub fn query_by_platform(&self, platform: &str) -> SyncResult<Vec<PlatformSummary>> {
        Ok(summarize_platform(&*self.load()?, platform))
    }

    pub fn query_cases(&self, interface: &str, status: &str, platform: Option<&str>) -> SyncResult<Vec<CaseRow>> {
        Ok(cases_by_status(&*self.load()?, interface, status, platform))
    }

    /// Every merged row with exactly this interface id
    pub fn interface_cases(&self, interface: &str, platform: Option<&str>) -> SyncResult<Vec<CaseRow>> {
        let snapshot = self.load()?;
        Ok(numbered(
            snapshot
                .merged
                .iter()
                .filter(|r| on_platform(r, platform) && r.interface_id == interface),
        ))
    }

    /// Merged rows of this interface that the tracker reports as unresolved
    pub fn merged_unresolved_cases(&self, interface: &str, platform: Option<&str>) -> SyncResult<Vec<CaseRow>> {
        let snapshot = self.load()?;
        Ok(numbered(snapshot.merged.iter().filter(|r| {
            on_platform(r, platform) && r.interface_id == interface && r.resolution == UNRESOLVED
        })))
    }
}

fn on_platform(row: &SnapshotRow, platform: Option<&str>) -> bool {
    platform.map_or(true, |p| row.platform == p)
}

fn normalize(interface: &str) -> String {
    interface.trim().to_lowercase()
}

fn numbered<'r>(rows: impl Iterator<Item = &'r SnapshotRow>) -> Vec<CaseRow> {
    rows.enumerate()
        .map(|(i, row)| CaseRow {
            sequence_number: i + 1,
            summary_text: row.summary.clone(),
            status_text: row.status.clone(),
        })
        .collect()
}

/// Group a platform's merged rows by interface.
///
/// Only interfaces with at least one Target row on the platform are reported.
pub fn summarize_platform(snapshot: &Snapshot, platform: &str) -> Vec<PlatformSummary> {
    let rows: Vec<&SnapshotRow> = snapshot
        .merged
        .iter()
        .filter(|r| r.platform == platform)
        .collect();

    let targets: BTreeSet<&str> = rows
        .iter()
        .filter(|r| r.category == Category::Target)
        .map(|r| r.interface_id.as_str())
        .collect();

    let mut groups: BTreeMap<&str, PlatformSummary> = BTreeMap::new();
    for row in rows {
        let interface = row.interface_id.as_str();
        if !targets.contains(interface) {
            continue;
        }
        let summary = groups
            .entry(interface)
            .or_insert_with(|| PlatformSummary::new(interface));
        match row.category {
            Category::Target => summary.target_count += 1,
            Category::Pass => summary.pass_count += 1,
            Category::Fail => summary.fail_count += 1,
            Category::Unresolved => {}
        }
        if row.resolution == UNRESOLVED {
            summary.unresolved_count += 1;
        }
    }
    groups.into_values().collect()
}

/// Case list for an interface under one status.
///
/// `unresolved` reads the separate unresolved sheet, `target` the Target rows,
/// and any other status matches against the producing filter's name.
pub fn cases_by_status(snapshot: &Snapshot, interface: &str, status: &str, platform: Option<&str>) -> Vec<CaseRow> {
    let wanted = normalize(interface);
    let matches_interface = |r: &SnapshotRow| normalize(&r.interface_id) == wanted;

    let declared = snapshot
        .merged
        .iter()
        .any(|r| r.category == Category::Target && on_platform(r, platform) && matches_interface(r));
    if !declared {
        debug!(interface, ?platform, "interface has no target rows");
        return Vec::new();
    }

    let status = status.trim().to_lowercase();
    let scoped = |r: &&SnapshotRow| on_platform(r, platform) && matches_interface(r);
    match status.as_str() {
        "unresolved" => numbered(snapshot.unresolved.iter().filter(scoped)),
        "target" => numbered(
            snapshot
                .merged
                .iter()
                .filter(scoped)
                .filter(|r| r.category == Category::Target),
        ),
        _ => numbered(
            snapshot
                .merged
                .iter()
                .filter(scoped)
                .filter(|r| r.filter.to_lowercase().contains(&status)),
        ),
    }
}
