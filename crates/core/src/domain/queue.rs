// Queue Domain Model

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use super::error::{DomainError, Result};

/// Highest value accepted for the random hexadecimal digit
pub const MAX_RNDHEX: u8 = 0xf;

/// Highest value accepted for a umask
pub const MAX_UMASK: u32 = 0o777;

/// Queue layout variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueType {
    /// Single-directory layout, one file per element
    Simple,
}

impl FromStr for QueueType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(QueueType::Simple),
            // Known layout, not driven by this harness
            "normal" => Err(DomainError::UnsupportedQueueType(s.to_string())),
            other => Err(DomainError::UnexpectedQueueType(other.to_string())),
        }
    }
}

impl std::fmt::Display for QueueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueType::Simple => write!(f, "simple"),
        }
    }
}

/// Options used to open a queue handle
///
/// Every tunable is optional: `None` means "use the implementation default".
/// For `max_lock` and `max_temp`, `Some(0)` is a distinct state that
/// disables purging of that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueOptions {
    pub path: PathBuf,
    pub queue_type: QueueType,
    /// Seconds covered by one intermediate directory
    pub granularity: Option<u32>,
    /// Hex digit appended to element names
    pub rndhex: Option<u8>,
    /// File creation mask
    pub umask: Option<u32>,
    /// Maximum lock age in seconds (0 disables lock purging)
    pub max_lock: Option<u64>,
    /// Maximum temporary element age in seconds (0 disables temp purging)
    pub max_temp: Option<u64>,
}

impl QueueOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            queue_type: QueueType::Simple,
            granularity: None,
            rndhex: None,
            umask: None,
            max_lock: None,
            max_temp: None,
        }
    }

    /// Check value ranges that the queue layout depends on
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(DomainError::InvalidOption {
                option: "path",
                reason: "queue path must not be empty".to_string(),
            });
        }

        if let Some(rndhex) = self.rndhex {
            if rndhex > MAX_RNDHEX {
                return Err(DomainError::InvalidOption {
                    option: "rndhex",
                    reason: format!("{} is not a hexadecimal digit", rndhex),
                });
            }
        }

        if let Some(umask) = self.umask {
            if umask > MAX_UMASK {
                return Err(DomainError::InvalidOption {
                    option: "umask",
                    reason: format!("{:o} exceeds {:o}", umask, MAX_UMASK),
                });
            }
        }

        Ok(())
    }
}
