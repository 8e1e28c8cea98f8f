//! Role-scoped access grants on saved queries

use tracing::{debug, info, warn};

use crate::core::error::{SyncError, SyncResult};
use crate::core::tracker::{NewGrant, PermissionGrant, RoleKind, ScopeType, Tracker};

/// Default ceiling for [`PermissionManager::remove_all`]
pub const DEFAULT_MAX_REVOKE_ITERATIONS: usize = 500;

pub struct PermissionManager<'a> {
    tracker: &'a dyn Tracker,
    max_revoke_iterations: usize,
}

impl<'a> PermissionManager<'a> {
    pub fn new(tracker: &'a dyn Tracker) -> Self {
        Self {
            tracker,
            max_revoke_iterations: DEFAULT_MAX_REVOKE_ITERATIONS,
        }
    }

    pub fn with_max_revoke_iterations(mut self, max: usize) -> Self {
        self.max_revoke_iterations = max;
        self
    }

    pub fn list(&self, filter_id: &str) -> SyncResult<Vec<PermissionGrant>> {
        self.tracker.list_permissions(filter_id)
    }

    /// Grant a project role view (or view+edit) access to a filter
    pub fn add_role(&self, filter_id: &str, project_key: &str, role_name: &str, kind: RoleKind) -> SyncResult<()> {
        let (project_id, role_id) = self.resolve_role(project_key, role_name)?;
        self.tracker.add_permission(
            filter_id,
            &NewGrant {
                project_id,
                role_id,
                kind,
            },
        )?;
        info!(filter_id, project_key, role_name, %kind, "added role permission");
        Ok(())
    }

    /// Remove the grant matching the project role. Returns false when nothing matched.
    pub fn remove_role(&self, filter_id: &str, project_key: &str, role_name: &str, kind: RoleKind) -> SyncResult<bool> {
        let (project_id, role_id) = self.resolve_role(project_key, role_name)?;
        let grants = self.tracker.list_permissions(filter_id)?;

        let Some(grant) = grants
            .iter()
            .find(|g| matches_role(g, &project_id, &role_id))
        else {
            info!(filter_id, project_key, role_name, %kind, "no matching role permission, nothing to remove");
            return Ok(false);
        };

        self.tracker.delete_permission(filter_id, &grant.id)?;
        info!(filter_id, grant_id = %grant.id, %kind, "removed role permission");
        Ok(true)
    }

    /// Remove every managed grant from a filter, re-listing after each deletion.
    /// Returns the number of grants deleted.
    pub fn remove_all(&self, filter_id: &str) -> SyncResult<usize> {
        let mut removed = 0;
        loop {
            let grants = self.tracker.list_permissions(filter_id)?;
            let Some(grant) = grants.iter().find(|g| g.scope_type.is_managed()) else {
                break;
            };

            if removed >= self.max_revoke_iterations {
                warn!(filter_id, attempts = removed, "permissions keep reappearing, giving up");
                return Err(SyncError::RevokeLoopExhausted {
                    filter_id: filter_id.to_string(),
                    attempts: removed,
                });
            }

            self.tracker.delete_permission(filter_id, &grant.id)?;
            debug!(filter_id, grant_id = %grant.id, scope = %grant.scope_type, "removed permission");
            removed += 1;
        }
        info!(filter_id, removed, "removed all permissions");
        Ok(removed)
    }

    fn resolve_role(&self, project_key: &str, role_name: &str) -> SyncResult<(String, String)> {
        let project_id = self.tracker.get_project_id(project_key).map_err(|e| {
            if e.is_remote_not_found() {
                SyncError::not_found("Project", project_key)
            } else {
                e
            }
        })?;
        let role_id = self
            .tracker
            .get_project_role_id(project_key, role_name)?
            .ok_or_else(|| SyncError::not_found("Role", format!("{} in project {}", role_name, project_key)))?;
        Ok((project_id, role_id))
    }
}

/// Project-role grants come back from the tracker with scope `project` plus a role object
fn matches_role(grant: &PermissionGrant, project_id: &str, role_id: &str) -> bool {
    if grant.scope_type != ScopeType::Project {
        return false;
    }
    if grant.project_id.as_deref() != Some(project_id) {
        return false;
    }
    // Both kinds require the role object; an editor grant is the same entry with edit rights
    grant.role_id.as_deref() == Some(role_id)
}
