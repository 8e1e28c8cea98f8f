//! In-memory tracker used by unit tests

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::{IssueRecord, NewGrant, PermissionGrant, RoleKind, SavedQuery, ScopeType, Tracker};
use crate::core::error::{SyncError, SyncResult, DUPLICATE_FILTER_MESSAGE};

#[derive(Default)]
struct Project {
    id: String,
    roles: BTreeMap<String, String>,
    statuses: Vec<String>,
}

#[derive(Default)]
struct State {
    filters: BTreeMap<String, SavedQuery>,
    next_filter_id: u64,
    permissions: HashMap<String, Vec<PermissionGrant>>,
    next_grant_id: u64,
    issues: BTreeMap<String, IssueRecord>,
    search_results: HashMap<String, Vec<String>>,
    failing_deletes: HashSet<String>,
    projects: BTreeMap<String, Project>,
    sticky_permissions: bool,
    calls: Vec<String>,
}

/// Tracker double that records every call it receives
pub(crate) struct FakeTracker {
    state: Mutex<State>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_filter_id: 10000,
                next_grant_id: 1,
                ..State::default()
            }),
        }
    }

    pub fn with_filter(self, id: &str, name: &str, jql: &str) -> Self {
        self.state.lock().unwrap().filters.insert(
            id.to_string(),
            SavedQuery {
                id: id.to_string(),
                name: name.to_string(),
                query_text: jql.to_string(),
                description: String::new(),
            },
        );
        self
    }

    pub fn with_issue(self, issue: IssueRecord) -> Self {
        self.state
            .lock()
            .unwrap()
            .issues
            .insert(issue.key.clone(), issue);
        self
    }

    /// Issues (by key) returned when `jql` is searched
    pub fn with_search(self, jql: &str, keys: &[&str]) -> Self {
        self.state.lock().unwrap().search_results.insert(
            jql.to_string(),
            keys.iter().map(|k| k.to_string()).collect(),
        );
        self
    }

    pub fn with_failing_delete(self, key: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(key.to_string());
        self
    }

    pub fn with_project(self, key: &str, id: &str, roles: &[(&str, &str)], statuses: &[&str]) -> Self {
        self.state.lock().unwrap().projects.insert(
            key.to_string(),
            Project {
                id: id.to_string(),
                roles: roles
                    .iter()
                    .map(|(name, id)| (name.to_string(), id.to_string()))
                    .collect(),
                statuses: statuses.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_grant(self, filter_id: &str, grant: PermissionGrant) -> Self {
        self.state
            .lock()
            .unwrap()
            .permissions
            .entry(filter_id.to_string())
            .or_default()
            .push(grant);
        self
    }

    /// Deleting a permission reports success but never removes it
    pub fn with_sticky_permissions(self) -> Self {
        self.state.lock().unwrap().sticky_permissions = true;
        self
    }

    pub fn grant(id: &str, scope: &str, project_id: Option<&str>, role_id: Option<&str>) -> PermissionGrant {
        PermissionGrant {
            id: id.to_string(),
            scope_type: ScopeType::parse(scope),
            project_id: project_id.map(str::to_string),
            role_id: role_id.map(str::to_string),
            can_view: true,
            can_edit: false,
        }
    }

    pub fn filters(&self) -> Vec<SavedQuery> {
        self.state.lock().unwrap().filters.values().cloned().collect()
    }

    pub fn permissions(&self, filter_id: &str) -> Vec<PermissionGrant> {
        self.state
            .lock()
            .unwrap()
            .permissions
            .get(filter_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn issue_keys(&self) -> Vec<String> {
        self.state.lock().unwrap().issues.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

fn not_found(body: &str) -> SyncError {
    SyncError::RemoteRejected {
        status: 404,
        body: body.to_string(),
    }
}

impl Tracker for FakeTracker {
    fn search(&self, jql: &str, max_results: u32, _fields: &[&str]) -> SyncResult<Vec<IssueRecord>> {
        let state = self.record(format!("search {}", jql));
        let keys = state.search_results.get(jql).cloned().unwrap_or_default();
        Ok(keys
            .iter()
            .filter_map(|k| state.issues.get(k).cloned())
            .take(max_results as usize)
            .collect())
    }

    fn get_filter(&self, id: &str) -> SyncResult<SavedQuery> {
        let state = self.record(format!("get_filter {}", id));
        state
            .filters
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("The selected filter is not available to you"))
    }

    fn find_filter_by_name(&self, name: &str) -> SyncResult<Option<SavedQuery>> {
        let state = self.record(format!("find_filter {}", name));
        Ok(state.filters.values().find(|f| f.name == name).cloned())
    }

    fn create_filter(&self, name: &str, jql: &str, description: &str) -> SyncResult<String> {
        let mut state = self.record(format!("create_filter {}", name));
        if state.filters.values().any(|f| f.name == name) {
            return Err(SyncError::RemoteRejected {
                status: 400,
                body: format!(r#"{{"errorMessages":["{}."]}}"#, DUPLICATE_FILTER_MESSAGE),
            });
        }
        let id = state.next_filter_id.to_string();
        state.next_filter_id += 1;
        state.filters.insert(
            id.clone(),
            SavedQuery {
                id: id.clone(),
                name: name.to_string(),
                query_text: jql.to_string(),
                description: description.to_string(),
            },
        );
        Ok(id)
    }

    fn update_filter(&self, id: &str, jql: &str) -> SyncResult<()> {
        let mut state = self.record(format!("update_filter {}", id));
        let filter = state
            .filters
            .get_mut(id)
            .ok_or_else(|| not_found("filter not found"))?;
        filter.query_text = jql.to_string();
        Ok(())
    }

    fn delete_issue(&self, key: &str) -> SyncResult<()> {
        let mut state = self.record(format!("delete_issue {}", key));
        if state.failing_deletes.contains(key) {
            return Err(SyncError::RemoteRejected {
                status: 403,
                body: "You do not have permission to delete issues in this project.".to_string(),
            });
        }
        state
            .issues
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| not_found("Issue does not exist or you do not have permission to see it."))
    }

    fn list_permissions(&self, filter_id: &str) -> SyncResult<Vec<PermissionGrant>> {
        let state = self.record(format!("list_permissions {}", filter_id));
        Ok(state.permissions.get(filter_id).cloned().unwrap_or_default())
    }

    fn add_permission(&self, filter_id: &str, grant: &NewGrant) -> SyncResult<()> {
        let mut state = self.record(format!("add_permission {}", filter_id));
        let id = state.next_grant_id.to_string();
        state.next_grant_id += 1;
        // The tracker reports project-role grants back with scope `project` and a role object
        state
            .permissions
            .entry(filter_id.to_string())
            .or_default()
            .push(PermissionGrant {
                id,
                scope_type: ScopeType::Project,
                project_id: Some(grant.project_id.clone()),
                role_id: Some(grant.role_id.clone()),
                can_view: true,
                can_edit: grant.kind == RoleKind::Editor,
            });
        Ok(())
    }

    fn delete_permission(&self, filter_id: &str, grant_id: &str) -> SyncResult<()> {
        let mut state = self.record(format!("delete_permission {} {}", filter_id, grant_id));
        if state.sticky_permissions {
            return Ok(());
        }
        let grants = state.permissions.entry(filter_id.to_string()).or_default();
        let before = grants.len();
        grants.retain(|g| g.id != grant_id);
        if grants.len() == before {
            return Err(not_found("permission not found"));
        }
        Ok(())
    }

    fn get_project_id(&self, project_key: &str) -> SyncResult<String> {
        let state = self.record(format!("get_project {}", project_key));
        state
            .projects
            .get(project_key)
            .map(|p| p.id.clone())
            .ok_or_else(|| not_found("No project could be found"))
    }

    fn get_project_role_id(&self, project_key: &str, role_name: &str) -> SyncResult<Option<String>> {
        let state = self.record(format!("get_role {} {}", project_key, role_name));
        let project = state
            .projects
            .get(project_key)
            .ok_or_else(|| not_found("No project could be found"))?;
        Ok(project
            .roles
            .iter()
            .find(|(name, _)| name.to_lowercase() == role_name.to_lowercase())
            .map(|(_, id)| id.clone()))
    }

    fn list_project_role_names(&self, project_key: &str) -> SyncResult<Vec<String>> {
        let state = self.record(format!("list_roles {}", project_key));
        let project = state
            .projects
            .get(project_key)
            .ok_or_else(|| not_found("No project could be found"))?;
        Ok(project.roles.keys().cloned().collect())
    }

    fn list_project_keys(&self) -> SyncResult<Vec<String>> {
        let state = self.record("list_projects".to_string());
        Ok(state.projects.keys().cloned().collect())
    }

    fn list_project_statuses(&self, project_key: &str) -> SyncResult<Vec<String>> {
        let state = self.record(format!("list_statuses {}", project_key));
        let project = state
            .projects
            .get(project_key)
            .ok_or_else(|| not_found("No project could be found"))?;
        Ok(project.statuses.clone())
    }
}
