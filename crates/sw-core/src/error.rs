//! Error types for sw-core

use thiserror::Error;

/// Core error type for Stepwise
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Configured folder does not exist
    #[error("[C004] Folder '{name}': '{path}' does not exist")]
    FolderNotFound { name: String, path: String },

    /// C005: Configured folder is a file
    #[error("[C005] Folder '{name}': '{path}' is not a directory")]
    NotADirectory { name: String, path: String },

    /// C006: IO error with file path context
    #[error("[C006] IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
