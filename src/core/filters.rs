//! Saved-query (filter) registry
//!
//! Resolves filters by id or name and keeps create-or-update idempotent: the
//! same name always converges to one filter whose id (and therefore whose
//! permission grants) never changes.

use tracing::{debug, info};

use crate::core::error::{SyncError, SyncResult};
use crate::core::tracker::{SavedQuery, Tracker};

/// Description given to filters created through the registry
pub const DEFAULT_DESCRIPTION: &str = "Created via API";

/// True when the identifier is a filter id rather than a name
pub fn is_filter_id(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

pub struct FilterRegistry<'a> {
    tracker: &'a dyn Tracker,
}

impl<'a> FilterRegistry<'a> {
    pub fn new(tracker: &'a dyn Tracker) -> Self {
        Self { tracker }
    }

    /// Resolve a numeric id directly, anything else as an exact filter name
    pub fn resolve(&self, identifier: &str) -> SyncResult<SavedQuery> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(SyncError::invalid("filter identifier is empty"));
        }
        if is_filter_id(identifier) {
            debug!(id = identifier, "resolving filter by id");
            return self.tracker.get_filter(identifier).map_err(|e| {
                if e.is_remote_not_found() {
                    SyncError::not_found("Filter", identifier)
                } else {
                    e
                }
            });
        }
        debug!(name = identifier, "resolving filter by name");
        self.tracker
            .find_filter_by_name(identifier)?
            .ok_or_else(|| SyncError::not_found("Filter", identifier))
    }

    /// Update the named filter's query in place, or create it when absent
    pub fn create_or_update(&self, name: &str, jql: &str) -> SyncResult<SavedQuery> {
        if name.trim().is_empty() || jql.trim().is_empty() {
            return Err(SyncError::invalid("filter name and JQL are required"));
        }

        if let Some(existing) = self.tracker.find_filter_by_name(name)? {
            return self.update(existing, jql);
        }

        match self.tracker.create_filter(name, jql, DEFAULT_DESCRIPTION) {
            Ok(id) => {
                info!(%id, name, "created filter");
                Ok(SavedQuery {
                    id,
                    name: name.to_string(),
                    query_text: jql.to_string(),
                    description: DEFAULT_DESCRIPTION.to_string(),
                })
            }
            // Someone created it between our lookup and create
            Err(err) if err.is_duplicate_filter() => {
                let existing = self
                    .tracker
                    .find_filter_by_name(name)?
                    .ok_or(err)?;
                self.update(existing, jql)
            }
            Err(err) => Err(err),
        }
    }

    /// Return the id of the named filter, creating it only if it does not exist.
    /// An existing filter's query is left untouched.
    pub fn ensure_exists(&self, name: &str, jql: &str, description: &str) -> SyncResult<String> {
        if let Some(existing) = self.tracker.find_filter_by_name(name)? {
            debug!(id = %existing.id, name, "filter already exists");
            return Ok(existing.id);
        }
        match self.tracker.create_filter(name, jql, description) {
            Ok(id) => {
                info!(%id, name, "created filter");
                Ok(id)
            }
            Err(err) if err.is_duplicate_filter() => self
                .tracker
                .find_filter_by_name(name)?
                .map(|f| f.id)
                .ok_or(err),
            Err(err) => Err(err),
        }
    }

    fn update(&self, mut existing: SavedQuery, jql: &str) -> SyncResult<SavedQuery> {
        self.tracker.update_filter(&existing.id, jql)?;
        info!(id = %existing.id, name = %existing.name, "updated filter JQL");
        existing.query_text = jql.to_string();
        Ok(existing)
    }
}
