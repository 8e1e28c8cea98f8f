//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::error::{SyncError, SyncResult};
use crate::core::labels::{LabelClassifier, DEFAULT_PLATFORMS, DEFAULT_STATUS_LABELS};
use crate::core::permissions::DEFAULT_MAX_REVOKE_ITERATIONS;
use crate::core::project::Project;
use crate::core::snapshot::Category;

/// Default issue cap for a single search
pub const DEFAULT_MAX_RESULTS: u32 = 100;

/// ipmirror configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Tracker site, e.g. `example.atlassian.net`
    pub domain: Option<String>,

    /// Account email used for basic auth
    pub email: Option<String>,

    /// API token used for basic auth
    #[serde(skip_serializing)]
    pub api_token: Option<String>,

    /// Full REST base URL; overrides `domain`
    pub base_url: Option<String>,

    /// Project whose category filters `refresh` sets up
    pub project_key: Option<String>,

    /// Snapshot database location, relative paths resolve against the workspace root
    pub snapshot_path: Option<PathBuf>,

    pub max_results: Option<u32>,

    pub request_timeout_secs: Option<u64>,

    pub max_revoke_iterations: Option<usize>,

    /// Platform label allow-list
    pub platforms: Option<Vec<String>>,

    /// Labels that carry status rather than interface information
    pub status_labels: Option<Vec<String>>,

    /// Explicit category to filter id map; skips filter setup on refresh
    pub category_filters: Option<BTreeMap<Category, String>>,

    /// Workspace root the config was loaded for
    #[serde(skip)]
    pub(crate) root: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> SyncResult<Self> {
        let mut config = Config::default();

        // 1. Built-in defaults (accessors below)

        // 2. Global user config (~/.config/ipmirror/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::from_file(&global_path)?);
            }
        }

        // 3. Workspace config (.ipmirror/config.yaml)
        if let Some(project) = project {
            let project_config_path = project.config_path();
            if project_config_path.exists() {
                config.merge(Self::from_file(&project_config_path)?);
            }
            config.root = Some(project.root().to_path_buf());
        }

        // 4. Environment variables
        config.merge(Self::from_env(|key| std::env::var(key).ok()));

        Ok(config)
    }

    /// Parse one config file
    pub fn from_file(path: &Path) -> SyncResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SyncError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        // A file of only comments is an empty document
        if is_blank_document(&contents) {
            return Ok(Config::default());
        }
        let parsed: Option<Config> = serde_yml::from_str(&contents).map_err(|e| SyncError::Config {
            message: format!("invalid config {}: {}", path.display(), e),
        })?;
        Ok(parsed.unwrap_or_default())
    }

    fn from_env(var: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            domain: var("JIRA_DOMAIN"),
            email: var("JIRA_EMAIL"),
            api_token: var("JIRA_API_TOKEN"),
            base_url: var("IPMIRROR_BASE_URL"),
            project_key: var("IPMIRROR_PROJECT_KEY"),
            snapshot_path: var("IPMIRROR_SNAPSHOT").map(PathBuf::from),
            ..Config::default()
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ipmirror")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            domain,
            email,
            api_token,
            base_url,
            project_key,
            snapshot_path,
            max_results,
            request_timeout_secs,
            max_revoke_iterations,
            platforms,
            status_labels,
            category_filters,
            root,
        );
    }

    /// REST base URL: explicit `base_url`, else `https://{domain}/rest/api/3`
    pub fn tracker_base_url(&self) -> SyncResult<String> {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.trim().to_string());
        }
        match self.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => {
                let domain = domain
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/');
                Ok(format!("https://{}/rest/api/3", domain))
            }
            _ => Err(SyncError::Config {
                message: "tracker domain is not set (JIRA_DOMAIN or base_url)".to_string(),
            }),
        }
    }

    /// Snapshot location, resolved against the workspace root when relative
    pub fn snapshot_path(&self) -> PathBuf {
        let path = self
            .snapshot_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(Project::DIR_NAME).join("snapshot.db"));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }

    pub fn max_results(&self) -> u32 {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
    }

    pub fn max_revoke_iterations(&self) -> usize {
        self.max_revoke_iterations
            .unwrap_or(DEFAULT_MAX_REVOKE_ITERATIONS)
    }

    pub fn classifier(&self) -> LabelClassifier {
        match (&self.platforms, &self.status_labels) {
            (None, None) => LabelClassifier::default(),
            (platforms, statuses) => {
                let default_platforms: Vec<String> =
                    DEFAULT_PLATFORMS.iter().map(|s| s.to_string()).collect();
                let default_statuses: Vec<String> =
                    DEFAULT_STATUS_LABELS.iter().map(|s| s.to_string()).collect();
                LabelClassifier::new(
                    platforms.as_deref().unwrap_or(&default_platforms),
                    statuses.as_deref().unwrap_or(&default_statuses),
                )
            }
        }
    }
}

fn is_blank_document(contents: &str) -> bool {
    contents.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_results(), 100);
        assert_eq!(config.max_revoke_iterations(), 500);
        assert_eq!(config.snapshot_path(), PathBuf::from(".ipmirror/snapshot.db"));
        assert!(config.tracker_base_url().is_err());
    }

    #[test]
    fn test_base_url_from_domain() {
        let config = Config {
            domain: Some("https://example.atlassian.net/".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.tracker_base_url().unwrap(),
            "https://example.atlassian.net/rest/api/3"
        );

        let config = Config {
            base_url: Some("http://127.0.0.1:8080/rest/api/3".to_string()),
            ..config
        };
        assert_eq!(
            config.tracker_base_url().unwrap(),
            "http://127.0.0.1:8080/rest/api/3"
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(
            &path,
            "domain: file.atlassian.net\nproject_key: DS\nmax_results: 50\ncategory_filters:\n  Target: \"10231\"\n",
        )
        .unwrap();

        let mut config = Config::from_file(&path).unwrap();
        config.merge(Config::from_env(env(&[("JIRA_DOMAIN", "env.atlassian.net")])));

        assert_eq!(config.domain.as_deref(), Some("env.atlassian.net"));
        assert_eq!(config.project_key.as_deref(), Some("DS"));
        assert_eq!(config.max_results(), 50);
        assert_eq!(
            config.category_filters.unwrap()[&Category::Target],
            "10231"
        );
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "max_results: [not, a, number]\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, SyncError::Config { .. }));
    }

    #[test]
    fn test_comment_only_file_is_default() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "# nothing set yet\n# project_key: DS\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert!(config.project_key.is_none());
        assert_eq!(config.max_results(), 100);

        std::fs::write(&path, "").unwrap();
        assert!(Config::from_file(&path).unwrap().domain.is_none());
    }

    #[test]
    fn test_freshly_initialized_workspace_loads() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let config = Config::from_file(&project.config_path()).unwrap();
        assert!(config.category_filters.is_none());
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_relative_snapshot_resolves_against_workspace() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let config = Config::load(Some(&project)).unwrap();
        assert!(config.snapshot_path().starts_with(project.root()));

        let config = Config {
            snapshot_path: Some(PathBuf::from("/srv/ipmirror/snapshot.db")),
            ..config
        };
        assert_eq!(config.snapshot_path(), PathBuf::from("/srv/ipmirror/snapshot.db"));
    }

    #[test]
    fn test_custom_platforms() {
        let config = Config {
            platforms: Some(vec!["FPGA".to_string()]),
            ..Config::default()
        };
        let labels = config.classifier().classify(&["fpga", "SVB", "UART"]);
        assert_eq!(labels.platform, "FPGA");
        assert_eq!(labels.interface_id, "SVB");
    }
}
