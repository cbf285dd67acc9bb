// Element Domain Model

use serde::{Deserialize, Serialize};

/// Opaque element identifier produced by queue enumeration
///
/// Scenario logic never parses or builds these; only the queue
/// implementation that issued an id knows what it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a purge pass reclaimed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeStats {
    /// Stale locks released (elements visible again)
    pub locks_released: u64,
    /// Orphaned temporary elements deleted
    pub temps_removed: u64,
    /// Empty intermediate directories deleted
    pub dirs_removed: u64,
}
