//! Application layer - Use cases and orchestration
//!
//! Defines the ports through which the request pipeline and the response
//! cache are reached, the error taxonomy shared by every layer above the
//! domain, and the batch orchestrator that drives chunked fetches.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
