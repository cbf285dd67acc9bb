// Dirq Test Core - Scenario Engine & Queue Contract
// NO filesystem dependencies: queue storage lives behind the port layer

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};
