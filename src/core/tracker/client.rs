//! Blocking Jira REST v3 client

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::types::{
    role_id_from_link, AddPermissionBody, CreateFilterBody, CreatedFilter, FilterJson, FilterPage,
    IssueTypeStatuses, PermissionJson, ProjectJson, ProjectPage, RoleLinks, SearchResponse,
    UpdateFilterBody,
};
use super::{IssueRecord, NewGrant, PermissionGrant, SavedQuery, Tracker};
use crate::core::config::Config;
use crate::core::error::{SyncError, SyncResult};

/// Authenticated client for one tracker site
pub struct TrackerClient {
    base_url: Url,
    email: String,
    api_token: String,
    http: Client,
}

impl TrackerClient {
    /// Create a client for a REST base URL such as `https://acme.atlassian.net/rest/api/3`
    pub fn new(base_url: &str, email: &str, api_token: &str) -> SyncResult<Self> {
        Self::with_timeout(base_url, email, api_token, None)
    }

    /// Like [`TrackerClient::new`], with an optional per-request deadline
    pub fn with_timeout(
        base_url: &str,
        email: &str,
        api_token: &str,
        timeout: Option<Duration>,
    ) -> SyncResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| SyncError::Config {
            message: format!("invalid tracker URL '{}': {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Config {
                message: format!("tracker URL '{}' cannot be used as a base", base_url),
            });
        }

        // reqwest's blocking client defaults to a 30s timeout; no deadline unless configured
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            email: email.to_string(),
            api_token: api_token.to_string(),
            http,
        })
    }

    /// Build a client from layered configuration
    pub fn from_config(config: &Config) -> SyncResult<Self> {
        let base_url = config.tracker_base_url()?;
        let email = config.email.as_deref().ok_or_else(|| SyncError::Config {
            message: "tracker email is not set (JIRA_EMAIL)".to_string(),
        })?;
        let api_token = config.api_token.as_deref().ok_or_else(|| SyncError::Config {
            message: "tracker API token is not set (JIRA_API_TOKEN)".to_string(),
        })?;

        Self::with_timeout(
            &base_url,
            email,
            api_token,
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send(&self, request: RequestBuilder) -> SyncResult<Response> {
        let response = request
            .basic_auth(&self.email, Some(&self.api_token))
            .header(ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(SyncError::RemoteRejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn decode<T: DeserializeOwned>(response: Response) -> SyncResult<T> {
        let text = response.text()?;
        serde_json::from_str(&text).map_err(|e| SyncError::Transport {
            message: format!("unexpected tracker response: {}", e),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> SyncResult<T> {
        let url = self.endpoint(segments);
        debug!(%url, "GET");
        let response = self.send(self.http.get(url).query(query))?;
        Self::decode(response)
    }

    fn with_body<B: Serialize>(request: RequestBuilder, body: &B) -> RequestBuilder {
        request.header(CONTENT_TYPE, "application/json").json(body)
    }
}

impl Tracker for TrackerClient {
    fn search(&self, jql: &str, max_results: u32, fields: &[&str]) -> SyncResult<Vec<IssueRecord>> {
        let query = [
            ("jql", jql.to_string()),
            ("maxResults", max_results.to_string()),
            ("fields", fields.join(",")),
        ];
        let page: SearchResponse = self.get_json(&["search"], &query)?;
        Ok(page.issues.into_iter().map(Into::into).collect())
    }

    fn get_filter(&self, id: &str) -> SyncResult<SavedQuery> {
        let filter: FilterJson = self.get_json(&["filter", id], &[])?;
        Ok(filter.into())
    }

    fn find_filter_by_name(&self, name: &str) -> SyncResult<Option<SavedQuery>> {
        let page: FilterPage =
            self.get_json(&["filter", "search"], &[("filterName", name.to_string())])?;
        Ok(page
            .values
            .into_iter()
            .find(|f| f.name == name)
            .map(Into::into))
    }

    fn create_filter(&self, name: &str, jql: &str, description: &str) -> SyncResult<String> {
        let body = CreateFilterBody {
            name,
            jql,
            description,
            favourite: false,
        };
        let request = Self::with_body(self.http.post(self.endpoint(&["filter"])), &body);
        let created: CreatedFilter = Self::decode(self.send(request)?)?;
        Ok(created.id)
    }

    fn update_filter(&self, id: &str, jql: &str) -> SyncResult<()> {
        let request = Self::with_body(
            self.http.put(self.endpoint(&["filter", id])),
            &UpdateFilterBody { jql },
        );
        self.send(request)?;
        Ok(())
    }

    fn delete_issue(&self, key: &str) -> SyncResult<()> {
        self.send(self.http.delete(self.endpoint(&["issue", key])))?;
        Ok(())
    }

    fn list_permissions(&self, filter_id: &str) -> SyncResult<Vec<PermissionGrant>> {
        let perms: Vec<PermissionJson> =
            self.get_json(&["filter", filter_id, "permission"], &[])?;
        Ok(perms.into_iter().map(Into::into).collect())
    }

    fn add_permission(&self, filter_id: &str, grant: &NewGrant) -> SyncResult<()> {
        let request = Self::with_body(
            self.http
                .post(self.endpoint(&["filter", filter_id, "permission"])),
            &AddPermissionBody::from(grant),
        );
        self.send(request)?;
        Ok(())
    }

    fn delete_permission(&self, filter_id: &str, grant_id: &str) -> SyncResult<()> {
        self.send(
            self.http
                .delete(self.endpoint(&["filter", filter_id, "permission", grant_id])),
        )?;
        Ok(())
    }

    fn get_project_id(&self, project_key: &str) -> SyncResult<String> {
        let project: ProjectJson = self.get_json(&["project", project_key], &[])?;
        Ok(project.id)
    }

    fn get_project_role_id(&self, project_key: &str, role_name: &str) -> SyncResult<Option<String>> {
        let roles: RoleLinks = self.get_json(&["project", project_key, "role"], &[])?;
        Ok(roles
            .iter()
            .find(|(name, _)| name.to_lowercase() == role_name.to_lowercase())
            .and_then(|(_, link)| role_id_from_link(link)))
    }

    fn list_project_role_names(&self, project_key: &str) -> SyncResult<Vec<String>> {
        let roles: RoleLinks = self.get_json(&["project", project_key, "role"], &[])?;
        Ok(roles.into_keys().collect())
    }

    fn list_project_keys(&self) -> SyncResult<Vec<String>> {
        let page: ProjectPage = self.get_json(&["project", "search"], &[])?;
        Ok(page.values.into_iter().map(|p| p.key).collect())
    }

    fn list_project_statuses(&self, project_key: &str) -> SyncResult<Vec<String>> {
        let issue_types: Vec<IssueTypeStatuses> =
            self.get_json(&["project", project_key, "statuses"], &[])?;
        let mut names: Vec<String> = issue_types
            .into_iter()
            .flat_map(|t| t.statuses.into_iter().map(|s| s.name))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}
