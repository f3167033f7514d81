//! Error types for wr
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown id or name)
//! - 3: Blocked by policy (project still referenced, disallowed workspace
//!   file, history index out of range)
//! - 4: Operation failed (storage I/O, serialization)

use thiserror::Error;

/// Exit codes for the wr CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for wr operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    #[error("Skill not found: {0}")]
    SkillNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Policy blocks (exit code 3)
    #[error("Cannot delete project with existing tasks. Reassign or delete tasks first.")]
    ProjectInUse(String),

    #[error("Workspace file not allowed: {0}")]
    FileNotAllowed(String),

    #[error("History index {index} out of range (history has {len} entries)")]
    HistoryIndexOutOfRange { index: usize, len: usize },

    #[error("Can only delete workspace skills: {0}")]
    SkillNotDeletable(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::TaskNotFound(_)
            | Error::ProjectNotFound(_)
            | Error::ReferenceNotFound(_)
            | Error::SkillNotFound(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_) => exit_codes::USER_ERROR,

            // Policy blocks
            Error::ProjectInUse(_)
            | Error::FileNotAllowed(_)
            | Error::HistoryIndexOutOfRange { .. }
            | Error::SkillNotDeletable(_) => exit_codes::POLICY_BLOCKED,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::Join(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable machine-readable kind for the JSON error envelope
    pub fn kind(&self) -> &'static str {
        match self.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            exit_codes::POLICY_BLOCKED => "policy_blocked",
            _ => "operation_failed",
        }
    }
}

/// Result type alias for wr operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_user_error() {
        let err = Error::TaskNotFound("abc123".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert_eq!(err.kind(), "user_error");
    }

    #[test]
    fn policy_block_is_distinct_from_not_found() {
        let in_use = Error::ProjectInUse("client-x".to_string());
        let missing = Error::ProjectNotFound("client-x".to_string());
        assert_ne!(in_use.exit_code(), missing.exit_code());
        assert_eq!(in_use.exit_code(), exit_codes::POLICY_BLOCKED);
    }

    #[test]
    fn io_failures_are_operation_failures() {
        let err = Error::Io(std::io::Error::other("disk gone"));
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    }
}
