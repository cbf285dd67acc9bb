// Application Layer - Scenarios and their building blocks

pub mod composite;
pub mod constants;
pub mod payload;
pub mod scenario;

// Re-exports
pub use composite::CompositeValidator;
pub use payload::PayloadGenerator;
pub use scenario::ScenarioRunner;
