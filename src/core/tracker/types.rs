//! Wire types for the Jira REST v3 responses the client consumes

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::{IssueRecord, NewGrant, PermissionGrant, RoleKind, SavedQuery, ScopeType};

/// Tracker ids arrive as JSON strings in some endpoints and numbers in others
pub(super) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct FilterJson {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub jql: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<FilterJson> for SavedQuery {
    fn from(f: FilterJson) -> Self {
        SavedQuery {
            id: f.id,
            name: f.name,
            query_text: f.jql.unwrap_or_default(),
            description: f.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct FilterPage {
    #[serde(default)]
    pub values: Vec<FilterJson>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateFilterBody<'a> {
    pub name: &'a str,
    pub jql: &'a str,
    pub description: &'a str,
    pub favourite: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct UpdateFilterBody<'a> {
    pub jql: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatedFilter {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct IdRef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct PermissionJson {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub project: Option<IdRef>,
    #[serde(default)]
    pub role: Option<IdRef>,
    #[serde(default)]
    pub view: Option<bool>,
    #[serde(default)]
    pub edit: Option<bool>,
}

impl From<PermissionJson> for PermissionGrant {
    fn from(p: PermissionJson) -> Self {
        PermissionGrant {
            id: p.id,
            scope_type: ScopeType::parse(&p.kind),
            project_id: p.project.map(|r| r.id),
            role_id: p.role.map(|r| r.id),
            can_view: p.view.unwrap_or(true),
            can_edit: p.edit.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AddPermissionBody<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub project_id: &'a str,
    pub project_role_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit: Option<bool>,
}

impl<'a> From<&'a NewGrant> for AddPermissionBody<'a> {
    fn from(grant: &'a NewGrant) -> Self {
        let editor = grant.kind == RoleKind::Editor;
        AddPermissionBody {
            kind: "projectRole",
            project_id: &grant.project_id,
            project_role_id: &grant.role_id,
            view: editor.then_some(true),
            edit: editor.then_some(true),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Named {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<Named>,
    #[serde(default)]
    pub duedate: Option<String>,
    #[serde(default)]
    pub resolution: Option<Named>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct IssueJson {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

impl From<IssueJson> for IssueRecord {
    fn from(issue: IssueJson) -> Self {
        let fields = issue.fields;
        IssueRecord {
            key: issue.key,
            summary: fields.summary,
            status: fields.status.map(|s| s.name),
            due_date: fields.duedate,
            resolution: fields.resolution.map(|r| r.name),
            labels: fields.labels,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<IssueJson>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProjectJson {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProjectKey {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProjectPage {
    #[serde(default)]
    pub values: Vec<ProjectKey>,
}

/// `GET /project/{key}/role` maps role names to role resource URLs
pub(super) type RoleLinks = BTreeMap<String, String>;

/// Extract the role id from a role resource URL (last path segment)
pub(super) fn role_id_from_link(link: &str) -> Option<String> {
    link.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
pub(super) struct IssueTypeStatuses {
    #[serde(default)]
    pub statuses: Vec<Named>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_ids_accept_numbers_and_strings() {
        let json = r#"[
            {"id": 10000, "type": "project", "project": {"id": "10001", "key": "DS"}, "role": {"id": 10360, "name": "Administrators"}},
            {"id": "10001", "type": "global"}
        ]"#;
        let perms: Vec<PermissionJson> = serde_json::from_str(json).unwrap();
        let grants: Vec<PermissionGrant> = perms.into_iter().map(Into::into).collect();

        assert_eq!(grants[0].id, "10000");
        assert_eq!(grants[0].scope_type, ScopeType::Project);
        assert_eq!(grants[0].project_id.as_deref(), Some("10001"));
        assert_eq!(grants[0].role_id.as_deref(), Some("10360"));
        assert!(grants[0].can_view);
        assert!(!grants[0].can_edit);

        assert_eq!(grants[1].scope_type, ScopeType::Global);
        assert_eq!(grants[1].project_id, None);
    }

    #[test]
    fn test_issue_with_null_fields() {
        let json = r#"{"issues": [
            {"key": "DS-1", "fields": {"summary": "UART loopback", "status": {"name": "Pass"},
              "duedate": null, "resolution": null, "labels": ["SVB", "UART"]}},
            {"key": "DS-2", "fields": {}}
        ]}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        let issues: Vec<IssueRecord> = resp.issues.into_iter().map(Into::into).collect();

        assert_eq!(issues[0].status.as_deref(), Some("Pass"));
        assert_eq!(issues[0].resolution, None);
        assert_eq!(issues[0].labels, vec!["SVB", "UART"]);
        assert_eq!(issues[1].summary, None);
        assert!(issues[1].labels.is_empty());
    }

    #[test]
    fn test_editor_grant_body_sets_rights() {
        let grant = NewGrant {
            project_id: "10001".to_string(),
            role_id: "10360".to_string(),
            kind: RoleKind::Editor,
        };
        let body = serde_json::to_value(AddPermissionBody::from(&grant)).unwrap();
        assert_eq!(body["type"], "projectRole");
        assert_eq!(body["projectId"], "10001");
        assert_eq!(body["projectRoleId"], "10360");
        assert_eq!(body["edit"], true);

        let viewer = NewGrant {
            kind: RoleKind::Viewer,
            ..grant
        };
        let body = serde_json::to_value(AddPermissionBody::from(&viewer)).unwrap();
        assert!(body.get("edit").is_none());
        assert!(body.get("view").is_none());
    }

    #[test]
    fn test_role_id_from_link() {
        assert_eq!(
            role_id_from_link("https://x.atlassian.net/rest/api/3/project/10001/role/10360"),
            Some("10360".to_string())
        );
        assert_eq!(
            role_id_from_link("https://x.atlassian.net/rest/api/3/project/10001/role/10002/"),
            Some("10002".to_string())
        );
        assert_eq!(role_id_from_link(""), None);
    }
}
