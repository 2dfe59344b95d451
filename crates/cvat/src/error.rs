//! Error types for CVAT operations

use std::path::PathBuf;
use thiserror::Error;

/// Raised when CVAT API operations fail
#[derive(Debug, Error)]
pub enum CvatError {
    #[error("Task {0} not found")]
    TaskNotFound(u64),

    #[error("Authentication failed. Check your auth token.")]
    Unauthorized,

    #[error("Failed to download dataset for task {task_id}: HTTP {status}")]
    Http { task_id: u64, status: u16 },

    #[error("Network error while downloading dataset: {0}")]
    Network(String),

    #[error("Invalid authorization header: {0}")]
    InvalidAuth(String),

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save dataset ZIP file: {0}")]
    Save(#[source] std::io::Error),

    #[error("Invalid ZIP file downloaded: {0}")]
    InvalidZip(String),

    #[error("Failed to extract ZIP file: {0}")]
    Extract(String),
}

pub type Result<T> = std::result::Result<T, CvatError>;
