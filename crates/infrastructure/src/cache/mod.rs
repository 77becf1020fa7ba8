//! Response cache
//!
//! Content-addressed storage of E-utilities payloads in SQLite. Entries are
//! keyed by a blake3 fingerprint of the endpoint and canonical parameters and
//! carry a blake3 checksum of the payload that is verified on every read.

mod sqlite_response_cache;

pub use sqlite_response_cache::{SqliteResponseCache, default_cache_path};

use domain::RequestDescriptor;

/// Fingerprint of an endpoint and its canonical parameter form
///
/// Stable across processes: 64 lowercase hex characters.
#[must_use]
pub fn fingerprint(endpoint: &str, canonical_params: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(endpoint.as_bytes());
    hasher.update(b":");
    hasher.update(canonical_params.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Fingerprint of a request descriptor
#[must_use]
pub fn descriptor_fingerprint(descriptor: &RequestDescriptor) -> String {
    fingerprint(descriptor.endpoint(), &descriptor.canonical_form())
}

/// Integrity checksum of a payload
#[must_use]
pub fn checksum(payload: &[u8]) -> String {
    blake3::hash(payload).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use domain::Database;

    use super::*;

    #[test]
    fn fingerprint_is_hex_and_deterministic() {
        let a = fingerprint("esearch.fcgi", r#"{"db":"pubmed"}"#);
        let b = fingerprint("esearch.fcgi", r#"{"db":"pubmed"}"#);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn fingerprint_depends_on_endpoint() {
        let params = r#"{"db":"pubmed","id":["1"]}"#;
        assert_ne!(fingerprint("esearch.fcgi", params), fingerprint("efetch.fcgi", params));
    }

    #[test]
    fn descriptor_fingerprint_ignores_insertion_order() {
        let a = RequestDescriptor::search(Database::pubmed(), "asthma")
            .param("retmax", 50_u32)
            .param("sort", "pub_date")
            .build()
            .unwrap();
        let b = RequestDescriptor::search(Database::pubmed(), "asthma")
            .param("sort", "pub_date")
            .param("retmax", 50_u32)
            .build()
            .unwrap();
        assert_eq!(descriptor_fingerprint(&a), descriptor_fingerprint(&b));
    }

    #[test]
    fn descriptor_fingerprint_is_sensitive_to_id_order() {
        let ids = |list: &[&str]| list.iter().map(ToString::to_string).collect::<Vec<_>>();
        let a = RequestDescriptor::fetch(Database::pubmed(), &ids(&["1", "2"]))
            .build()
            .unwrap();
        let b = RequestDescriptor::fetch(Database::pubmed(), &ids(&["2", "1"]))
            .build()
            .unwrap();
        assert_ne!(descriptor_fingerprint(&a), descriptor_fingerprint(&b));
    }

    #[test]
    fn checksum_detects_changes() {
        assert_eq!(checksum(b"<xml/>"), checksum(b"<xml/>"));
        assert_ne!(checksum(b"<xml/>"), checksum(b"<xml />"));
    }
}
