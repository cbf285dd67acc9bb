// Domain Layer - Scenario vocabulary and queue options

pub mod config;
pub mod element;
pub mod error;
pub mod identity;
pub mod queue;
pub mod scenario;

// Re-exports
pub use config::HarnessConfig;
pub use element::{ElementId, PurgeStats};
pub use error::DomainError;
pub use identity::HarnessIdentity;
pub use queue::{QueueOptions, QueueType};
pub use scenario::{CompositeReport, ScenarioKind, ScenarioReport};
