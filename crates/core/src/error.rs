// Central Error Type for the Harness

use std::path::PathBuf;
use thiserror::Error;

/// Harness-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    /// Missing or inconsistent option for the selected scenario
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure raised by the queue collaborator
    #[error("Storage error during {op} on {}: {source}", path.display())]
    Storage {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Residual on-disk structure does not match the expected shape
    #[error("Structural check failed: {0}")]
    Structure(String),
}

impl AppError {
    /// Wrap an I/O error raised while operating on `path`
    pub fn storage(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Storage {
            op,
            path: path.into(),
            source,
        }
    }

    /// True for failures raised by the storage layer (as opposed to harness misuse)
    pub fn is_storage(&self) -> bool {
        matches!(self, AppError::Storage { .. })
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
