//! Integration tests for the file-backed response cache
//!
//! These tests open real SQLite files in a temporary directory to verify
//! that entries survive a restart and that concurrent use stays consistent.

#![allow(clippy::expect_used)]

use std::sync::Arc;

use application::ResponseCachePort;
use chrono::Duration;
use domain::{Database, RequestDescriptor, ResponsePayload};
use infrastructure::{SqliteResponseCache, persistence::migrations};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn cache_path(dir: &TempDir) -> String {
    dir.path()
        .join("ncbi_cache.db")
        .to_str()
        .expect("utf-8 temp path")
        .to_string()
}

fn open(path: &str) -> SqliteResponseCache {
    SqliteResponseCache::open(path, Duration::days(30)).expect("Failed to open cache")
}

fn fetch(id: usize) -> RequestDescriptor {
    RequestDescriptor::fetch(Database::pubmed(), &[id.to_string()])
        .build()
        .expect("valid descriptor")
}

// ============================================================================
// Durability Tests
// ============================================================================

#[tokio::test]
async fn entries_survive_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let path = cache_path(&dir);
    let descriptor = fetch(1);
    let payload = ResponsePayload::from("<PubmedArticle>1</PubmedArticle>");

    {
        let cache = open(&path);
        cache.put(&descriptor, &payload).await.expect("put");
        cache.get(&descriptor).await.expect("get");
    }

    let reopened = open(&path);
    assert_eq!(
        reopened.get(&descriptor).await.expect("get"),
        Some(payload)
    );
    let entry = reopened
        .entry(&descriptor)
        .await
        .expect("entry")
        .expect("present");
    assert_eq!(entry.hit_count, 2);
}

#[tokio::test]
async fn reopen_does_not_rerun_migrations() {
    let dir = TempDir::new().expect("temp dir");
    let path = cache_path(&dir);

    drop(open(&path));
    let pool = infrastructure::create_pool(&path, 1).expect("pool");
    let conn = pool.get().expect("connection");

    assert_eq!(
        migrations::schema_version(&conn).expect("version"),
        migrations::SCHEMA_VERSION
    );
}

#[tokio::test]
async fn clear_all_persists() {
    let dir = TempDir::new().expect("temp dir");
    let path = cache_path(&dir);

    {
        let cache = open(&path);
        for id in 0..5 {
            cache
                .put(&fetch(id), &ResponsePayload::from(format!("<r{id}/>")))
                .await
                .expect("put");
        }
        assert_eq!(cache.clear_all().await.expect("clear"), 5);
    }

    let stats = open(&path).get_stats().await.expect("stats");
    assert_eq!(stats.total_entries, 0);
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_and_readers() {
    let dir = TempDir::new().expect("temp dir");
    let cache = Arc::new(open(&cache_path(&dir)));

    let mut handles = Vec::new();
    for id in 0..20 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            let descriptor = fetch(id);
            let payload = ResponsePayload::from(format!("<record id=\"{id}\"/>"));
            cache.put(&descriptor, &payload).await.expect("put");
            let read = cache.get(&descriptor).await.expect("get");
            assert_eq!(read, Some(payload));
        }));
    }
    for handle in handles {
        handle.await.expect("task");
    }

    let stats = cache.get_stats().await.expect("stats");
    assert_eq!(stats.total_entries, 20);
    assert_eq!(stats.total_hits, 20);
    assert_eq!(stats.by_endpoint["efetch.fcgi"].entries, 20);
}

#[tokio::test]
async fn lookups_do_not_wait_for_a_writer() {
    let dir = TempDir::new().expect("temp dir");
    let path = cache_path(&dir);
    let cache = open(&path);
    let stored = fetch(1);
    cache
        .put(&stored, &ResponsePayload::from("<a/>"))
        .await
        .expect("put");

    let writer = rusqlite::Connection::open(&path).expect("second connection");
    writer.execute_batch("BEGIN IMMEDIATE").expect("write lock");

    let miss = tokio::time::timeout(std::time::Duration::from_secs(2), cache.get(&fetch(2)))
        .await
        .expect("miss blocked behind the writer");
    assert_eq!(miss.expect("get"), None);

    writer.execute_batch("COMMIT").expect("release");
    assert!(cache.get(&stored).await.expect("get").is_some());
    let entry = cache.entry(&stored).await.expect("entry").expect("present");
    assert_eq!(entry.hit_count, 1);
}
