#![forbid(unsafe_code)]
//! NCBI E-utilities transport
//!
//! The network boundary of the client: one GET request in, raw bytes and a
//! status out. Failures are classified into connection errors, timeouts,
//! rate limiting (HTTP 429), server errors (5xx) and client errors (other
//! 4xx) so the retry policy above can tell them apart.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_eutils::{EutilsConfig, EutilsTransport, ReqwestTransport, TransportRequest};
//!
//! let config = EutilsConfig::default();
//! let transport = ReqwestTransport::new(&config)?;
//! let request = TransportRequest::new(config.endpoint_url("esearch.fcgi"), params, config.timeout());
//! let response = transport.send(&request).await?;
//! ```

mod client;
mod config;
mod error;
mod transport;

pub use client::ReqwestTransport;
pub use config::EutilsConfig;
pub use error::TransportError;
pub use transport::{EutilsTransport, TransportRequest, TransportResponse};
