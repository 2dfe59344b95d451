//! Error types for release workflows

use std::path::PathBuf;
use thiserror::Error;

fn exit_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none (terminated by signal)".to_string())
}

/// Raised when a convention is violated or an external command fails
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("Invalid semantic version '{0}', expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    #[error("Invalid dataset name '{0}', expected letters, digits, '.', '_' or '-'")]
    InvalidDatasetName(String),

    #[error("'{0}' does not match any data commit convention")]
    UnknownCommitMessage(String),

    #[error("Tag '{0}' must have the form data/v<semver>")]
    InvalidTag(String),

    #[error("Data directory must be a relative path inside the repository: {}", .0.display())]
    InvalidDataDir(PathBuf),

    #[error("No DVC remote URL configured (dvc.remote_url)")]
    MissingRemote,

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with exit code {}: {stderr}", exit_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Step {step} ({description}) failed: {source}")]
    StepFailed {
        step: usize,
        description: String,
        #[source]
        source: Box<ReleaseError>,
    },
}

pub type Result<T> = std::result::Result<T, ReleaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_message() {
        let err = ReleaseError::CommandFailed {
            command: "dvc push".to_string(),
            code: Some(1),
            stderr: "ERROR: failed to push data to the cloud".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`dvc push` failed with exit code 1: ERROR: failed to push data to the cloud"
        );

        let err = ReleaseError::CommandFailed {
            command: "git push".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }
}
