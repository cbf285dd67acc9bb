// Harness process identity

use chrono::{DateTime, Utc};

/// Identity of the running harness process
///
/// Created once at startup and handed to whoever labels output with it.
#[derive(Debug, Clone)]
pub struct HarnessIdentity {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

impl HarnessIdentity {
    /// Capture the identity of the current process
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            started_at: Utc::now(),
        }
    }
}
