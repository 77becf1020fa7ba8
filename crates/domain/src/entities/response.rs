//! Tagged E-utilities responses

use serde::{Deserialize, Serialize};

use crate::entities::{FetchResult, RequestDescriptor, ResponsePayload, SearchResult};
use crate::errors::DomainError;
use crate::value_objects::{Operation, ResponseMode};

/// Parsed response, tagged by the operation that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EutilsResponse {
    Search(SearchResult),
    Fetch(FetchResult),
}

impl EutilsResponse {
    /// Parse a raw payload according to the descriptor's operation
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidResponse`] or [`DomainError::RemoteError`]
    /// when the payload does not match the operation.
    pub fn parse(
        descriptor: &RequestDescriptor,
        payload: &ResponsePayload,
    ) -> Result<Self, DomainError> {
        match descriptor.operation() {
            Operation::Search => {
                if descriptor.response_mode() != ResponseMode::Json {
                    return Err(DomainError::InvalidResponse(format!(
                        "search results are only typed for json, got {}",
                        descriptor.response_mode()
                    )));
                }
                SearchResult::from_payload(payload).map(Self::Search)
            },
            Operation::Fetch => FetchResult::from_payload(descriptor, payload).map(Self::Fetch),
        }
    }

    /// Check that a payload is a usable answer to `descriptor`
    ///
    /// Looser than [`Self::parse`]: searches in modes that are not typed
    /// pass unchecked, while Entrez error envelopes and malformed JSON
    /// searches are rejected.
    ///
    /// # Errors
    ///
    /// Same as [`Self::parse`].
    pub fn validate(
        descriptor: &RequestDescriptor,
        payload: &ResponsePayload,
    ) -> Result<(), DomainError> {
        match descriptor.operation() {
            Operation::Search if descriptor.response_mode() != ResponseMode::Json => Ok(()),
            _ => Self::parse(descriptor, payload).map(|_| ()),
        }
    }

    pub const fn operation(&self) -> Operation {
        match self {
            Self::Search(_) => Operation::Search,
            Self::Fetch(_) => Operation::Fetch,
        }
    }

    pub fn into_search(self) -> Option<SearchResult> {
        match self {
            Self::Search(result) => Some(result),
            Self::Fetch(_) => None,
        }
    }

    pub fn into_fetch(self) -> Option<FetchResult> {
        match self {
            Self::Fetch(result) => Some(result),
            Self::Search(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Database;

    #[test]
    fn search_payload_is_tagged() {
        let descriptor = RequestDescriptor::search(Database::pubmed(), "x")
            .build()
            .unwrap();
        let payload = ResponsePayload::from(r#"{"esearchresult":{"count":"1","idlist":["9"]}}"#);

        let response = EutilsResponse::parse(&descriptor, &payload).unwrap();
        assert_eq!(response.operation(), Operation::Search);
        assert_eq!(response.into_search().unwrap().idlist, vec!["9"]);
    }

    #[test]
    fn fetch_payload_is_tagged() {
        let descriptor = RequestDescriptor::fetch(Database::pubmed(), &["9".to_string()])
            .build()
            .unwrap();
        let response =
            EutilsResponse::parse(&descriptor, &ResponsePayload::from("<PubmedArticleSet/>"))
                .unwrap();
        assert!(response.clone().into_search().is_none());
        assert_eq!(response.into_fetch().unwrap().body, "<PubmedArticleSet/>");
    }

    #[test]
    fn xml_search_is_not_typed() {
        let descriptor = RequestDescriptor::search(Database::pubmed(), "x")
            .response_mode(ResponseMode::Xml)
            .build()
            .unwrap();
        let result = EutilsResponse::parse(&descriptor, &ResponsePayload::from("<x/>"));
        assert!(matches!(result, Err(DomainError::InvalidResponse(_))));
    }

    #[test]
    fn validate_accepts_untyped_search_modes() {
        let descriptor = RequestDescriptor::search(Database::pubmed(), "x")
            .response_mode(ResponseMode::Xml)
            .build()
            .unwrap();
        assert!(EutilsResponse::validate(&descriptor, &ResponsePayload::from("<x/>")).is_ok());
    }

    #[test]
    fn validate_rejects_error_envelope_and_garbage() {
        let descriptor = RequestDescriptor::search(Database::pubmed(), "x")
            .build()
            .unwrap();

        let remote = ResponsePayload::from(r#"{"esearchresult":{"ERROR":"Invalid query"}}"#);
        assert!(matches!(
            EutilsResponse::validate(&descriptor, &remote),
            Err(DomainError::RemoteError(_))
        ));
        assert!(matches!(
            EutilsResponse::validate(&descriptor, &ResponsePayload::from("<html>")),
            Err(DomainError::InvalidResponse(_))
        ));
    }
}
