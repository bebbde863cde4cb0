//! Error types for store, service and configuration operations.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("task '{id}' not found")]
    NotFound { id: String },

    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },
}

impl TodoError {
    pub fn not_found(id: impl Into<String>) -> Self {
        TodoError::NotFound { id: id.into() }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        TodoError::Validation { field, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;
