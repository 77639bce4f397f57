//! Error types for Carbon

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Carbon operations
pub type Result<T> = std::result::Result<T, CarbonError>;

/// Carbon error types
#[derive(Error, Debug)]
pub enum CarbonError {
    #[error("Invalid input: {0}")]
    UserInput(String),

    #[error("Service already running: {}", .0.join(", "))]
    AlreadyRunning(Vec<String>),

    #[error("No services found")]
    EmptySelection,

    #[error("Carbon file parse error in {}: {message}", path.display())]
    CatalogParse { path: PathBuf, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Command `{command}` failed: {reason}")]
    ExternalTool { command: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for CarbonError {
    fn from(e: sqlx::Error) -> Self {
        CarbonError::Storage(e.to_string())
    }
}

impl From<tokio::task::JoinError> for CarbonError {
    fn from(e: tokio::task::JoinError) -> Self {
        CarbonError::Internal(format!("task failed: {}", e))
    }
}
