//! Workspace discovery and layout

use std::path::{Path, PathBuf};
use thiserror::Error;

/// An ipmirror workspace: a directory containing `.ipmirror/`
#[derive(Debug)]
pub struct Project {
    /// Root directory of the workspace (parent of .ipmirror/)
    root: PathBuf,
}

impl Project {
    pub const DIR_NAME: &'static str = ".ipmirror";

    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(Self::DIR_NAME).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a workspace at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(Self::DIR_NAME).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }
        Self::write_layout(root)
    }

    /// Initialize even if .ipmirror/ exists, rewriting the default config
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_layout(root)
    }

    fn write_layout(root: PathBuf) -> Result<Self, ProjectError> {
        let project = Self { root };
        std::fs::create_dir_all(project.dir()).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.dir().join(".gitignore"), "snapshot.db\n.snapshot.db.tmp-*\n")
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# ipmirror workspace configuration
#
# Credentials are best kept in the environment:
#   JIRA_DOMAIN, JIRA_EMAIL, JIRA_API_TOKEN

# Tracker site (or set base_url to a full REST URL)
# domain: example.atlassian.net
# base_url: https://example.atlassian.net/rest/api/3

# Project whose category filters `ipmirror refresh` creates
# project_key: DS

# Snapshot database, relative to the workspace root
# snapshot_path: .ipmirror/snapshot.db

# Issue cap per search (no pagination)
# max_results: 100

# Ceiling for `ipmirror role remove-all`
# max_revoke_iterations: 500

# Label allow-lists
# platforms: [JTAMP, JTAES, JTAEN, SVB]
# status_labels: [TARGET, PASS, FAIL, UNRESOLVED]

# Use existing filters instead of the auto-created ones
# category_filters:
#   Target: "10231"
#   Pass: "10232"
#   Fail: "10233"
#   Unresolved: "10234"
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .ipmirror directory
    pub fn dir(&self) -> PathBuf {
        self.root.join(Self::DIR_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir().join("config.yaml")
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an ipmirror workspace (searched from {searched_from:?}). Run 'ipmirror init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("ipmirror workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
