// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid test name: {0}")]
    InvalidScenario(String),

    #[error("unsupported DirQ type: {0}")]
    UnsupportedQueueType(String),

    #[error("unexpected DirQ type: {0}")]
    UnexpectedQueueType(String),

    #[error("invalid value for --{option}: {reason}")]
    InvalidOption { option: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
