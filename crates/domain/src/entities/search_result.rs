//! Typed ESearch result
//!
//! ESearch answers with a JSON envelope `{"esearchresult": {...}}`. Numeric
//! fields arrive as strings, and query errors are reported inside the
//! envelope with an `ERROR` key instead of a non-2xx status.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::entities::ResponsePayload;
use crate::errors::DomainError;

/// One term translation applied by Entrez
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub from: String,
    pub to: String,
}

/// Validated response from ESearch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total number of matching records
    #[serde(default, deserialize_with = "u64_from_text_or_number")]
    pub count: u64,

    /// Number of identifiers returned
    #[serde(default, deserialize_with = "u64_from_text_or_number")]
    pub retmax: u64,

    /// Index of the first returned identifier
    #[serde(default, deserialize_with = "u64_from_text_or_number")]
    pub retstart: u64,

    #[serde(default)]
    pub idlist: Vec<String>,

    #[serde(default)]
    pub translationset: Vec<Translation>,

    /// Human-readable query translation
    #[serde(default)]
    pub querytranslation: Option<String>,

    /// Warnings about query terms, grouped by kind
    #[serde(default)]
    pub warninglist: Option<BTreeMap<String, Vec<String>>>,

    /// Errors in query processing, grouped by kind
    #[serde(default)]
    pub errorlist: Option<BTreeMap<String, Vec<String>>>,
}

impl SearchResult {
    /// Parse the JSON envelope returned by ESearch
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidResponse`] when the payload is not the
    /// expected envelope and [`DomainError::RemoteError`] when Entrez
    /// reported an error inside it.
    pub fn from_payload(payload: &ResponsePayload) -> Result<Self, DomainError> {
        let envelope: Value = serde_json::from_slice(payload.as_bytes())
            .map_err(|e| DomainError::InvalidResponse(format!("ESearch body is not JSON: {e}")))?;

        let result = envelope.get("esearchresult").ok_or_else(|| {
            DomainError::InvalidResponse("missing 'esearchresult' object".to_string())
        })?;

        if let Some(message) = result.get("ERROR").and_then(Value::as_str) {
            return Err(DomainError::RemoteError(message.to_string()));
        }

        Self::deserialize(result)
            .map_err(|e| DomainError::InvalidResponse(format!("malformed ESearch result: {e}")))
    }

    /// True if the search matched records and returned identifiers
    pub fn has_results(&self) -> bool {
        self.count > 0 && !self.idlist.is_empty()
    }

    /// True if more results exist beyond the returned page
    pub const fn has_more_results(&self) -> bool {
        self.retstart + self.retmax < self.count
    }
}

fn u64_from_text_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
