// Storage inspection port
use crate::error::Result;
use std::path::Path;

/// Read-only view of the storage under a queue root
///
/// Only used for pre-conditions and the residual structure check of the
/// composite scenario; scenario logic otherwise goes through the queue.
pub trait StorageProbe: Send + Sync {
    /// Whether anything exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Number of direct children of `path` (0 when `path` is missing)
    fn count_entries(&self, path: &Path) -> Result<usize>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Mock StorageProbe returning canned answers
    pub struct MockStorageProbe {
        exists: AtomicBool,
        entries: AtomicUsize,
    }

    impl MockStorageProbe {
        pub fn new(exists: bool, entries: usize) -> Self {
            Self {
                exists: AtomicBool::new(exists),
                entries: AtomicUsize::new(entries),
            }
        }

        pub fn set_entries(&self, entries: usize) {
            self.entries.store(entries, Ordering::SeqCst);
        }
    }

    impl StorageProbe for MockStorageProbe {
        fn exists(&self, _path: &Path) -> bool {
            self.exists.load(Ordering::SeqCst)
        }

        fn count_entries(&self, _path: &Path) -> Result<usize> {
            Ok(self.entries.load(Ordering::SeqCst))
        }
    }
}
