// Port Layer - Interfaces for external dependencies

pub mod queue;
pub mod storage_probe;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use queue::{DirectoryQueue, ElementIter, QueueFactory};
pub use storage_probe::StorageProbe;
pub use time_provider::TimeProvider;
