//! Integration tests for the infrastructure crate
//!
//! Tests cover:
//! - The full request pipeline against a mocked E-utilities server
//! - Batch fetching through the pipeline
//! - Retry delays and fingerprints with property-based tests

use std::sync::Arc;
use std::time::Duration;

use application::{ApplicationError, BatchService, EutilsPort, EutilsPortExt, FetchOptions, SearchOptions};
use domain::{ContactEmail, Database, RequestDescriptor};
use infrastructure::{
    Credentials, EutilsAdapter, RetryConfig, SqliteResponseCache, descriptor_fingerprint,
};
use integration_eutils::{EutilsConfig, ReqwestTransport};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn esearch_body(ids: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "esearchresult": {
            "count": ids.len().to_string(),
            "retmax": ids.len().to_string(),
            "retstart": "0",
            "idlist": ids,
            "querytranslation": "asthma[All Fields]"
        }
    })
}

fn pipeline(server: &MockServer) -> EutilsAdapter {
    let config = EutilsConfig::for_testing(server.uri());
    let transport = ReqwestTransport::new(&config).unwrap();
    let credentials = Credentials::new(
        ContactEmail::new("dev@example.org").unwrap(),
        None,
        "pipeline-tests",
    );
    EutilsAdapter::new(Arc::new(transport), config, credentials)
        .with_retry_config(RetryConfig::new(10, 50, 2.0, 3))
}

// ============================================================================
// Request Pipeline Tests
// ============================================================================

mod pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn search_sends_credentials_and_parses_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .and(query_param("db", "pubmed"))
            .and(query_param("term", "asthma"))
            .and(query_param("retmode", "json"))
            .and(query_param("email", "dev@example.org"))
            .and(query_param("tool", "pipeline-tests"))
            .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(&["11", "12"])))
            .expect(1)
            .mount(&server)
            .await;

        let result = pipeline(&server)
            .search(&Database::pubmed(), "asthma", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.count, 2);
        assert_eq!(result.idlist, vec!["11", "12"]);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(&["1"])))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = pipeline(&server);
        let result = adapter
            .search(&Database::pubmed(), "asthma", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.idlist, vec!["1"]);
        assert_eq!(adapter.rate_limiter().acquired(), 3);
    }

    #[tokio::test]
    async fn bad_request_fails_after_one_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid query"))
            .expect(1)
            .mount(&server)
            .await;

        let descriptor = RequestDescriptor::search(Database::pubmed(), "((").build().unwrap();
        let err = pipeline(&server).request(&descriptor).await.unwrap_err();

        assert_eq!(err.attempts(), Some(1));
        assert!(matches!(
            err.root_cause(),
            ApplicationError::ClientRequest { status: 400, .. }
        ));
    }

    #[tokio::test]
    async fn remote_error_field_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "esearchresult": { "ERROR": "Invalid query syntax" }
            })))
            .mount(&server)
            .await;

        let err = pipeline(&server)
            .search(&Database::pubmed(), "((", &SearchOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ClientRequest { .. }));
    }

    #[tokio::test]
    async fn cached_response_avoids_second_call() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<PubmedArticleSet/>"))
            .expect(1)
            .mount(&server)
            .await;

        let cache = Arc::new(SqliteResponseCache::in_memory(chrono::Duration::days(30)).unwrap());
        let adapter = pipeline(&server).with_cache(cache);
        let ids = vec!["100".to_string(), "200".to_string()];

        for _ in 0..3 {
            let fetched = adapter
                .fetch(&Database::pubmed(), &ids, &FetchOptions::default())
                .await
                .unwrap();
            assert_eq!(fetched.body, "<PubmedArticleSet/>");
        }
        assert_eq!(adapter.rate_limiter().acquired(), 1);
    }
}

// ============================================================================
// Batch Tests
// ============================================================================

mod batch_tests {
    use super::*;

    #[tokio::test]
    async fn batch_fetch_splits_ids_into_ordered_chunks() {
        let server = MockServer::start().await;

        for (chunk, ids) in [("a", "1,2"), ("b", "3,4"), ("c", "5")] {
            Mock::given(method("GET"))
                .and(path("/efetch.fcgi"))
                .and(query_param("id", ids))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!("<chunk {chunk}/>")))
                .expect(1)
                .mount(&server)
                .await;
        }

        let service = BatchService::new(Arc::new(pipeline(&server)));
        let ids: Vec<String> = (1..=5).map(|i| i.to_string()).collect();
        let mut progress = Vec::new();
        let mut record = |done: usize, total: usize| progress.push((done, total));

        let results = service
            .fetch_batch(
                &Database::pubmed(),
                &ids,
                2,
                &FetchOptions::default(),
                Some(&mut record),
            )
            .await
            .unwrap();

        let bodies: Vec<_> = results.iter().map(|r| r.body.as_str()).collect();
        assert_eq!(bodies, vec!["<chunk a/>", "<chunk b/>", "<chunk c/>"]);
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn retry_delay_never_exceeds_max(
            initial in 1u64..1000u64,
            max in 1000u64..100_000u64,
            multiplier in 1.0f64..5.0f64,
            attempt in 0u32..40u32
        ) {
            let config = RetryConfig::new(initial, max, multiplier, 10).with_jitter(0.5);
            let delay = config.delay_for_attempt(attempt);
            prop_assert!(delay <= Duration::from_millis(max));
        }

        #[test]
        fn retry_delay_is_monotonic_without_jitter(
            initial in 1u64..5000u64,
            attempt in 0u32..20u32
        ) {
            let config = RetryConfig::new(initial, 60_000, 2.0, 10);
            prop_assert!(config.delay_for_attempt(attempt) <= config.delay_for_attempt(attempt + 1));
        }

        #[test]
        fn fingerprint_ignores_parameter_order(
            term in "[a-z]{1,12}",
            retmax in 1u32..500u32,
            sort in "[a-z_]{1,10}"
        ) {
            let forward = RequestDescriptor::search(Database::pubmed(), term.clone())
                .param("retmax", retmax)
                .param("sort", sort.clone())
                .build()
                .unwrap();
            let backward = RequestDescriptor::search(Database::pubmed(), term)
                .param("sort", sort)
                .param("retmax", retmax)
                .build()
                .unwrap();
            prop_assert_eq!(descriptor_fingerprint(&forward), descriptor_fingerprint(&backward));
        }

        #[test]
        fn fingerprint_tracks_id_order(ids in proptest::collection::vec("[0-9]{1,8}", 2..20)) {
            let mut reversed = ids.clone();
            reversed.reverse();
            prop_assume!(reversed != ids);

            let a = RequestDescriptor::fetch(Database::pubmed(), &ids).build().unwrap();
            let b = RequestDescriptor::fetch(Database::pubmed(), &reversed).build().unwrap();
            prop_assert_ne!(descriptor_fingerprint(&a), descriptor_fingerprint(&b));
        }
    }
}
