use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Unified error type for workpad operations
#[derive(Debug, Error)]
pub enum WorkpadError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    // Validation errors (rejected before any I/O)
    #[error("Workspace name must not be empty")]
    EmptyWorkspaceName,

    #[error("Page title must not be empty")]
    EmptyPageTitle,

    // Identity errors
    #[error("No active user. Log in first.")]
    NotLoggedIn,

    #[error("No account found for '{0}'")]
    UnknownUser(String),

    #[error("An account already exists for '{0}'")]
    UserAlreadyExists(String),

    // Lookup errors (only for operations that must produce a value;
    // mutations on missing ids are silent no-ops instead)
    #[error("Workspace '{0}' not found")]
    WorkspaceNotFound(String),

    #[error("Page '{0}' not found")]
    PageNotFound(String),

    // Datastore errors
    #[error("Datastore error: {0}")]
    Storage(String),
}

/// Result type alias for workpad operations
pub type Result<T> = std::result::Result<T, WorkpadError>;

/// A serializable representation of WorkpadError for IPC (e.g., Tauri, wasm-bindgen)
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
}

impl From<&WorkpadError> for SerializableError {
    fn from(err: &WorkpadError) -> Self {
        let kind = match err {
            WorkpadError::Io(_) => "Io",
            WorkpadError::FileRead { .. } => "FileRead",
            WorkpadError::FileWrite { .. } => "FileWrite",
            WorkpadError::Json(_) => "Json",
            WorkpadError::ConfigParse(_) => "ConfigParse",
            WorkpadError::ConfigSerialize(_) => "ConfigSerialize",
            WorkpadError::NoConfigDir => "NoConfigDir",
            WorkpadError::EmptyWorkspaceName => "EmptyWorkspaceName",
            WorkpadError::EmptyPageTitle => "EmptyPageTitle",
            WorkpadError::NotLoggedIn => "NotLoggedIn",
            WorkpadError::UnknownUser(_) => "UnknownUser",
            WorkpadError::UserAlreadyExists(_) => "UserAlreadyExists",
            WorkpadError::WorkspaceNotFound(_) => "WorkspaceNotFound",
            WorkpadError::PageNotFound(_) => "PageNotFound",
            WorkpadError::Storage(_) => "Storage",
        }
        .to_string();

        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<WorkpadError> for SerializableError {
    fn from(err: WorkpadError) -> Self {
        SerializableError::from(&err)
    }
}

impl WorkpadError {
    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}
