//! Request descriptors
//!
//! A [`RequestDescriptor`] names everything that distinguishes one
//! E-utilities call from another: database, operation, parameters and
//! response mode. It is immutable once built and is the only input used to
//! derive both the cache fingerprint and the outbound query string.
//!
//! Credentials are deliberately absent. The contact email and API key are
//! appended by the request pipeline, so cached responses are shared across
//! keys and a key never ends up inside a fingerprint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DomainError;
use crate::value_objects::{Database, Operation, ParamValue, ResponseMode};

/// Parameters that are set by the descriptor itself or by the pipeline
const RESERVED_KEYS: [&str; 5] = ["db", "retmode", "email", "api_key", "tool"];

/// Parameter holding identifier lists
const ID_KEY: &str = "id";

/// Maximum length of a single value in [`RequestDescriptor::summary`]
const SUMMARY_VALUE_LEN: usize = 60;

/// Immutable description of one E-utilities request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    database: Database,
    operation: Operation,
    params: BTreeMap<String, ParamValue>,
    response_mode: ResponseMode,
}

impl RequestDescriptor {
    /// Start building a descriptor for an arbitrary operation
    pub fn builder(database: Database, operation: Operation) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(database, operation)
    }

    /// Start building an ESearch descriptor for `term`
    pub fn search(database: Database, term: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(database, Operation::Search).param("term", term.into())
    }

    /// Start building an EFetch descriptor for the given identifiers
    pub fn fetch(database: Database, ids: &[String]) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(database, Operation::Fetch).param(ID_KEY, ids)
    }

    pub const fn database(&self) -> &Database {
        &self.database
    }

    pub const fn operation(&self) -> Operation {
        self.operation
    }

    pub const fn response_mode(&self) -> ResponseMode {
        self.response_mode
    }

    /// Caller-supplied parameters, without `db` and `retmode`
    pub const fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    /// Endpoint path relative to the E-utilities base URL
    pub const fn endpoint(&self) -> &'static str {
        self.operation.endpoint()
    }

    /// Identifiers carried by the `id` parameter, in request order
    pub fn ids(&self) -> Vec<String> {
        match self.params.get(ID_KEY) {
            Some(ParamValue::List(ids)) => ids.clone(),
            Some(ParamValue::Single(value)) => value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ToString::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Full parameter mapping in sorted key order, including `db` and `retmode`
    pub fn canonical_params(&self) -> BTreeMap<String, ParamValue> {
        let mut params = self.params.clone();
        params.insert(
            "db".to_string(),
            ParamValue::Single(self.database.as_str().to_string()),
        );
        params.insert(
            "retmode".to_string(),
            ParamValue::Single(self.response_mode.as_str().to_string()),
        );
        params
    }

    /// Canonical serialized parameters: JSON object with sorted keys
    ///
    /// List values keep their order, so the form is sensitive to identifier
    /// order but not to the order in which parameters were added.
    pub fn canonical_form(&self) -> String {
        let object: serde_json::Map<String, Value> = self
            .canonical_params()
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    ParamValue::Single(single) => Value::String(single),
                    ParamValue::List(list) => {
                        Value::Array(list.into_iter().map(Value::String).collect())
                    },
                };
                (key, value)
            })
            .collect();
        Value::Object(object).to_string()
    }

    /// Query string pairs for the outbound call (credentials excluded)
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.canonical_params()
            .into_iter()
            .map(|(key, value)| (key, value.to_query_value()))
            .collect()
    }

    /// Short human-readable description used in logs and error context
    pub fn summary(&self) -> String {
        self.canonical_params()
            .into_iter()
            .map(|(key, value)| {
                let rendered = match value {
                    ParamValue::List(list) if list.len() > 5 => {
                        format!("[{} items]", list.len())
                    },
                    other => other.to_query_value(),
                };
                if rendered.chars().count() > SUMMARY_VALUE_LEN {
                    let truncated: String = rendered.chars().take(SUMMARY_VALUE_LEN).collect();
                    format!("{key}={truncated}...")
                } else {
                    format!("{key}={rendered}")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Builder for [`RequestDescriptor`]
#[derive(Debug, Clone)]
pub struct RequestDescriptorBuilder {
    database: Database,
    operation: Operation,
    params: BTreeMap<String, ParamValue>,
    response_mode: Option<ResponseMode>,
    rejected_keys: Vec<String>,
}

impl RequestDescriptorBuilder {
    fn new(database: Database, operation: Operation) -> Self {
        Self {
            database,
            operation,
            params: BTreeMap::new(),
            response_mode: None,
            rejected_keys: Vec::new(),
        }
    }

    /// Add or replace a parameter
    ///
    /// An `id` value is always stored as a list, so `"1,2"` and `["1", "2"]`
    /// describe the same request.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let key = key.into();
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !RESERVED_KEYS.contains(&key.as_str());
        if valid {
            let value = value.into();
            let value = if key == ID_KEY { value.into_list() } else { value };
            self.params.insert(key, value);
        } else {
            self.rejected_keys.push(key);
        }
        self
    }

    /// Add a parameter only when a value is present
    #[must_use]
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl Into<ParamValue>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    #[must_use]
    pub const fn response_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = Some(mode);
        self
    }

    /// Validate and build the descriptor
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidDescriptor`] for reserved or malformed
    /// keys, a search without a term, or a fetch without identifiers.
    pub fn build(self) -> Result<RequestDescriptor, DomainError> {
        if !self.rejected_keys.is_empty() {
            return Err(DomainError::InvalidDescriptor(format!(
                "reserved or malformed parameter keys: {}",
                self.rejected_keys.join(", ")
            )));
        }

        let required = match self.operation {
            Operation::Search => "term",
            Operation::Fetch => ID_KEY,
        };
        let present = match self.params.get(required) {
            Some(ParamValue::Single(value)) => !value.trim().is_empty(),
            Some(ParamValue::List(values)) => !values.is_empty(),
            None => false,
        };
        if !present {
            return Err(DomainError::InvalidDescriptor(format!(
                "{} requires a non-empty '{required}' parameter",
                self.operation
            )));
        }

        Ok(RequestDescriptor {
            response_mode: self
                .response_mode
                .unwrap_or_else(|| self.operation.default_response_mode()),
            database: self.database,
            operation: self.operation,
            params: self.params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn search_descriptor_defaults_to_json() {
        let descriptor = RequestDescriptor::search(Database::pubmed(), "microbial ecology")
            .param("retmax", 100_u32)
            .build()
            .unwrap();

        assert_eq!(descriptor.operation(), Operation::Search);
        assert_eq!(descriptor.response_mode(), ResponseMode::Json);
        assert_eq!(descriptor.endpoint(), "esearch.fcgi");
    }

    #[test]
    fn canonical_form_is_sorted_and_includes_db_and_retmode() {
        let descriptor = RequestDescriptor::search(Database::pubmed(), "cancer")
            .param("sort", "pub_date")
            .param("retmax", 20_u32)
            .build()
            .unwrap();

        assert_eq!(
            descriptor.canonical_form(),
            r#"{"db":"pubmed","retmax":"20","retmode":"json","sort":"pub_date","term":"cancer"}"#
        );
    }

    #[test]
    fn canonical_form_ignores_insertion_order() {
        let a = RequestDescriptor::search(Database::pubmed(), "x")
            .param("retmax", 5_u32)
            .param("sort", "relevance")
            .build()
            .unwrap();
        let b = RequestDescriptor::builder(Database::pubmed(), Operation::Search)
            .param("sort", "relevance")
            .param("retmax", 5_u32)
            .param("term", "x")
            .build()
            .unwrap();

        assert_eq!(a.canonical_form(), b.canonical_form());
    }

    #[test]
    fn canonical_form_keeps_identifier_order() {
        let forward = RequestDescriptor::fetch(Database::pubmed(), &ids(&["1", "2", "3"]))
            .build()
            .unwrap();
        let reverse = RequestDescriptor::fetch(Database::pubmed(), &ids(&["3", "2", "1"]))
            .build()
            .unwrap();

        assert_ne!(forward.canonical_form(), reverse.canonical_form());
    }

    #[test]
    fn reserved_keys_are_rejected() {
        let result = RequestDescriptor::search(Database::pubmed(), "x")
            .param("api_key", "secret")
            .build();
        assert!(matches!(result, Err(DomainError::InvalidDescriptor(_))));

        let result = RequestDescriptor::search(Database::pubmed(), "x")
            .param("bad key", "v")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn required_parameters_are_enforced() {
        assert!(RequestDescriptor::search(Database::pubmed(), "  ").build().is_err());
        assert!(RequestDescriptor::fetch(Database::pubmed(), &[]).build().is_err());
        assert!(
            RequestDescriptor::builder(Database::pubmed(), Operation::Fetch)
                .build()
                .is_err()
        );
    }

    #[test]
    fn ids_and_query_pairs() {
        let descriptor = RequestDescriptor::fetch(Database::pubmed(), &ids(&["10", "20"]))
            .param("rettype", "abstract")
            .build()
            .unwrap();

        assert_eq!(descriptor.ids(), ids(&["10", "20"]));
        let pairs = descriptor.query_pairs();
        assert!(pairs.contains(&("id".to_string(), "10,20".to_string())));
        assert!(pairs.contains(&("retmode".to_string(), "xml".to_string())));
        assert!(pairs.contains(&("db".to_string(), "pubmed".to_string())));
    }

    #[test]
    fn ids_from_single_value_are_split() {
        let descriptor = RequestDescriptor::builder(Database::pubmed(), Operation::Fetch)
            .param("id", "1, 2,3")
            .build()
            .unwrap();
        assert_eq!(descriptor.ids(), ids(&["1", "2", "3"]));
    }

    #[test]
    fn id_string_and_id_list_describe_the_same_request() {
        let joined = RequestDescriptor::builder(Database::pubmed(), Operation::Fetch)
            .param("id", "1,2")
            .build()
            .unwrap();
        let listed = RequestDescriptor::fetch(Database::pubmed(), &ids(&["1", "2"]))
            .build()
            .unwrap();

        assert_eq!(joined.canonical_form(), listed.canonical_form());
        assert_eq!(joined, listed);
    }

    #[test]
    fn blank_id_string_is_rejected() {
        let result = RequestDescriptor::builder(Database::pubmed(), Operation::Fetch)
            .param("id", " , ")
            .build();
        assert!(matches!(result, Err(DomainError::InvalidDescriptor(_))));
    }

    #[test]
    fn summary_compacts_long_lists() {
        let many: Vec<String> = (0..250).map(|i| i.to_string()).collect();
        let descriptor = RequestDescriptor::fetch(Database::pubmed(), &many)
            .build()
            .unwrap();
        let summary = descriptor.summary();
        assert!(summary.contains("id=[250 items]"));
        assert!(summary.contains("db=pubmed"));
    }

    #[test]
    fn param_opt_skips_none() {
        let descriptor = RequestDescriptor::search(Database::pubmed(), "x")
            .param_opt("sort", None::<String>)
            .build()
            .unwrap();
        assert!(!descriptor.params().contains_key("sort"));
    }
}
