//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod credentials;
mod eutils_adapter;

pub use credentials::Credentials;
pub use eutils_adapter::EutilsAdapter;
