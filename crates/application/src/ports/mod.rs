//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod eutils_port;
mod response_cache_port;

#[cfg(test)]
pub use eutils_port::MockEutilsPort;
pub use eutils_port::{
    EutilsPort, EutilsPortExt, FetchOptions, SearchOptions, parse_response, validate_response,
};
#[cfg(test)]
pub use response_cache_port::MockResponseCachePort;
pub use response_cache_port::{CacheStats, EndpointStats, ResponseCachePort};
