//! Core module - tracker sync, snapshot, and aggregation

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filters;
pub mod labels;
pub mod permissions;
pub mod project;
pub mod purge;
pub mod snapshot;
pub mod tracker;

pub use aggregate::{AggregationService, CaseRow, PlatformSummary, SnapshotCache};
pub use config::Config;
pub use dashboard::{ApiResponse, Dashboard, SnapshotStatus};
pub use error::{SyncError, SyncResult};
pub use filters::FilterRegistry;
pub use labels::LabelClassifier;
pub use permissions::PermissionManager;
pub use project::{Project, ProjectError};
pub use purge::{PurgeOrchestrator, PurgeReport, PurgeTarget};
pub use snapshot::{Category, Snapshot, SnapshotBuilder, SnapshotRow, SnapshotStore};
pub use tracker::{Tracker, TrackerClient};
