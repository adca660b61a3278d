//! Error types for session, registry, storage and configuration operations.

use std::path::PathBuf;

use crate::types::Phase;

/// Errors surfaced by the session controller's operations.
///
/// None of these are fatal: each is scoped to the operation that raised it
/// and leaves the controller in a consistent phase.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    // ─────────────────────────────────────────────────────────────────────
    // Local input
    // ─────────────────────────────────────────────────────────────────────
    #[error("UID cannot be empty.")]
    EmptyCredential,

    #[error("Resume code cannot be empty.")]
    EmptyResumeCode,

    #[error("Invalid resume code. Please try again.")]
    InvalidResumeCode,

    // ─────────────────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────────────────
    #[error("Invalid UID. Please check your credentials and try again.")]
    InvalidCredential,

    #[error("This UID has already been used.")]
    AlreadyUsed,

    #[error("Could not reach the completion registry: {0}")]
    RegistryUnavailable(String),

    // ─────────────────────────────────────────────────────────────────────
    // Flow
    // ─────────────────────────────────────────────────────────────────────
    #[error("Could not enter fullscreen: {0}")]
    FullscreenUnavailable(String),

    #[error("cannot {action} during phase {actual}")]
    PhaseMismatch { action: &'static str, actual: Phase },

    #[error("Could not clear the termination record: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of a registry call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("credential not found")]
    NotFound,

    #[error("credential already used")]
    AlreadyUsed,

    #[error("credential missing from request")]
    MissingUid,

    #[error("registry server error: {0}")]
    Server(String),
}

/// Termination record persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("termination record I/O failed: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("termination record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Registry backing store failures. Every variant maps to HTTP 500.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file corrupt: {path}: {details}")]
    Corrupt { path: PathBuf, details: String },

    #[error("roster file invalid: {path}: {details}")]
    Roster { path: PathBuf, details: String },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file unreadable: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file malformed: {path}: {details}")]
    Malformed { path: PathBuf, details: String },

    #[error("config invalid: {0}")]
    Invalid(String),
}

/// Console input that does not parse as a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Fullscreen request or exit refused by the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ScreenError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_messages_are_user_facing() {
        assert_eq!(SessionError::EmptyCredential.to_string(), "UID cannot be empty.");
        assert_eq!(
            SessionError::InvalidResumeCode.to_string(),
            "Invalid resume code. Please try again."
        );
        let err = SessionError::PhaseMismatch { action: "start round 2", actual: Phase::Level1 };
        assert_eq!(err.to_string(), "cannot start round 2 during phase level1");
    }
}
