//! EFetch result

use serde::{Deserialize, Serialize};

use crate::entities::{RequestDescriptor, ResponsePayload};
use crate::errors::DomainError;
use crate::value_objects::{Database, ResponseMode};

/// Records returned by EFetch for one request
///
/// The body is kept as text in the requested response mode; record-level
/// parsing is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub database: Database,
    /// Identifiers requested, in request order
    pub ids: Vec<String>,
    pub response_mode: ResponseMode,
    pub body: String,
}

impl FetchResult {
    /// Build a fetch result from the descriptor that produced `payload`
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidResponse`] if the body is not UTF-8.
    pub fn from_payload(
        descriptor: &RequestDescriptor,
        payload: &ResponsePayload,
    ) -> Result<Self, DomainError> {
        let body = payload
            .as_text()
            .ok_or_else(|| DomainError::InvalidResponse("EFetch body is not UTF-8".to_string()))?;

        Ok(Self {
            database: descriptor.database().clone(),
            ids: descriptor.ids(),
            response_mode: descriptor.response_mode(),
            body: body.to_string(),
        })
    }

    /// Size of the body in bytes
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
