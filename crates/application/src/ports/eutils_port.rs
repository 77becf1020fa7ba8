//! E-utilities request port
//!
//! The request pipeline (cache, rate limiter, retry, transport) sits behind
//! [`EutilsPort`]. [`EutilsPortExt`] layers the typed search and fetch
//! operations on top of the raw payload interface.

use std::collections::BTreeMap;

use async_trait::async_trait;
use domain::{
    Database, DomainError, EutilsResponse, FetchResult, RequestDescriptor, ResponseMode,
    ResponsePayload, SearchResult,
};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for issuing E-utilities requests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EutilsPort: Send + Sync {
    /// Execute a request and return the raw payload
    async fn request(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponsePayload, ApplicationError>;
}

/// Options for ESearch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of identifiers to return (default 20)
    pub retmax: u32,
    /// Index of the first identifier (for pagination)
    pub retstart: u32,
    /// Sort order, e.g. `relevance` or `pub_date`
    pub sort: Option<String>,
    /// Additional ESearch parameters
    pub extra: BTreeMap<String, String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            retmax: 20,
            retstart: 0,
            sort: None,
            extra: BTreeMap::new(),
        }
    }
}

impl SearchOptions {
    /// Build the ESearch descriptor for `term`
    pub fn descriptor(
        &self,
        database: &Database,
        term: &str,
    ) -> Result<RequestDescriptor, DomainError> {
        self.extra
            .iter()
            .fold(
                RequestDescriptor::search(database.clone(), term)
                    .param("retmax", self.retmax)
                    .param("retstart", self.retstart)
                    .param_opt("sort", self.sort.clone()),
                |builder, (key, value)| builder.param(key.clone(), value.clone()),
            )
            .response_mode(ResponseMode::Json)
            .build()
    }
}

/// Options for EFetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Record view, e.g. `abstract` or `medline`
    pub rettype: Option<String>,
    /// Response mode (defaults to XML)
    pub response_mode: Option<ResponseMode>,
    /// Additional EFetch parameters
    pub extra: BTreeMap<String, String>,
}

impl FetchOptions {
    /// Build the EFetch descriptor for `ids`
    pub fn descriptor(
        &self,
        database: &Database,
        ids: &[String],
    ) -> Result<RequestDescriptor, DomainError> {
        let builder = self.extra.iter().fold(
            RequestDescriptor::fetch(database.clone(), ids)
                .param_opt("rettype", self.rettype.clone()),
            |builder, (key, value)| builder.param(key.clone(), value.clone()),
        );
        match self.response_mode {
            Some(mode) => builder.response_mode(mode),
            None => builder,
        }
        .build()
    }
}

/// Extension trait for typed E-utilities operations
#[async_trait]
pub trait EutilsPortExt: EutilsPort {
    /// Run an ESearch query
    async fn search(
        &self,
        database: &Database,
        term: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult, ApplicationError> {
        let descriptor = options.descriptor(database, term)?;
        let payload = self.request(&descriptor).await?;
        parse_response(&descriptor, &payload)?
            .into_search()
            .ok_or_else(|| ApplicationError::InvalidResponse("expected a search result".into()))
    }

    /// Fetch records for a list of identifiers in one request
    async fn fetch(
        &self,
        database: &Database,
        ids: &[String],
        options: &FetchOptions,
    ) -> Result<FetchResult, ApplicationError> {
        let descriptor = options.descriptor(database, ids)?;
        let payload = self.request(&descriptor).await?;
        parse_response(&descriptor, &payload)?
            .into_fetch()
            .ok_or_else(|| ApplicationError::InvalidResponse("expected a fetch result".into()))
    }
}

// Blanket implementation for all EutilsPort implementors
impl<T: EutilsPort + ?Sized> EutilsPortExt for T {}

/// Parse a payload into a tagged response, mapping parse failures
pub fn parse_response(
    descriptor: &RequestDescriptor,
    payload: &ResponsePayload,
) -> Result<EutilsResponse, ApplicationError> {
    EutilsResponse::parse(descriptor, payload).map_err(|e| response_error(descriptor, e))
}

/// Reject payloads that must not be served or cached for `descriptor`
///
/// Entrez error envelopes map to [`ApplicationError::ClientRequest`],
/// malformed bodies to [`ApplicationError::InvalidResponse`].
pub fn validate_response(
    descriptor: &RequestDescriptor,
    payload: &ResponsePayload,
) -> Result<(), ApplicationError> {
    EutilsResponse::validate(descriptor, payload).map_err(|e| response_error(descriptor, e))
}

fn response_error(descriptor: &RequestDescriptor, error: DomainError) -> ApplicationError {
    match error {
        DomainError::InvalidResponse(msg) => ApplicationError::InvalidResponse(msg),
        DomainError::RemoteError(msg) => ApplicationError::ClientRequest {
            endpoint: descriptor.endpoint().to_string(),
            status: 200,
            reason: msg,
        },
        other => ApplicationError::Domain(other),
    }
}
