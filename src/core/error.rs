//! Error taxonomy shared by the sync and aggregation core

use miette::Diagnostic;
use thiserror::Error;

/// Substring the tracker puts in a 400 body when a filter name is taken
pub const DUPLICATE_FILTER_MESSAGE: &str = "A filter with this name already exists";

/// Errors that can occur while talking to the tracker or serving the snapshot
#[derive(Debug, Error, Diagnostic)]
pub enum SyncError {
    /// Snapshot missing, locked, or unreadable by permission. Recoverable via the stale cache.
    #[error("Snapshot unavailable: {message}")]
    #[diagnostic(
        code(ipmirror::source_unavailable),
        help("run `ipmirror refresh` to rebuild the snapshot")
    )]
    SourceUnavailable { message: String },

    #[error("Snapshot data is corrupt: {message}")]
    #[diagnostic(code(ipmirror::data_corrupt))]
    DataCorrupt { message: String },

    #[error("Snapshot I/O error: {0}")]
    #[diagnostic(code(ipmirror::io))]
    Io(#[from] std::io::Error),

    #[error("{what} not found: {key}")]
    #[diagnostic(code(ipmirror::not_found))]
    NotFound { what: &'static str, key: String },

    #[error("Tracker rejected request ({status}): {body}")]
    #[diagnostic(code(ipmirror::remote_rejected))]
    RemoteRejected { status: u16, body: String },

    #[error("Tracker request failed: {message}")]
    #[diagnostic(code(ipmirror::transport))]
    Transport { message: String },

    #[error("{succeeded} deleted, {} failed", .failed.len())]
    #[diagnostic(code(ipmirror::partial_failure))]
    PartialFailure {
        succeeded: usize,
        failed: Vec<(String, String)>,
    },

    #[error("Permissions on filter {filter_id} still present after {attempts} removals")]
    #[diagnostic(
        code(ipmirror::revoke_loop_exhausted),
        help("the tracker kept returning grants; raise max_revoke_iterations or inspect the filter")
    )]
    RevokeLoopExhausted { filter_id: String, attempts: usize },

    #[error("Invalid input: {message}")]
    #[diagnostic(code(ipmirror::invalid_input))]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(ipmirror::config),
        help("set JIRA_DOMAIN, JIRA_EMAIL and JIRA_API_TOKEN or edit .ipmirror/config.yaml")
    )]
    Config { message: String },
}

impl SyncError {
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        SyncError::NotFound {
            what,
            key: key.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        SyncError::InvalidInput {
            message: message.into(),
        }
    }

    /// True when a filter creation was refused because the name already exists
    pub fn is_duplicate_filter(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteRejected { status: 400, body } if body.contains(DUPLICATE_FILTER_MESSAGE)
        )
    }

    /// True when the tracker answered 404
    pub fn is_remote_not_found(&self) -> bool {
        matches!(self, SyncError::RemoteRejected { status: 404, .. })
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport {
            message: err.to_string(),
        }
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_filter_detection() {
        let err = SyncError::RemoteRejected {
            status: 400,
            body: r#"{"errorMessages":["A filter with this name already exists."]}"#.to_string(),
        };
        assert!(err.is_duplicate_filter());

        let other = SyncError::RemoteRejected {
            status: 400,
            body: "JQL is invalid".to_string(),
        };
        assert!(!other.is_duplicate_filter());

        let wrong_status = SyncError::RemoteRejected {
            status: 500,
            body: DUPLICATE_FILTER_MESSAGE.to_string(),
        };
        assert!(!wrong_status.is_duplicate_filter());
    }

    #[test]
    fn test_partial_failure_message() {
        let err = SyncError::PartialFailure {
            succeeded: 3,
            failed: vec![("DS-1".to_string(), "403".to_string())],
        };
        assert_eq!(err.to_string(), "3 deleted, 1 failed");
    }

    #[test]
    fn test_remote_message_is_preserved() {
        let err = SyncError::RemoteRejected {
            status: 403,
            body: "You do not have permission".to_string(),
        };
        assert!(err.to_string().contains("You do not have permission"));
        assert!(err.to_string().contains("403"));
    }
}
