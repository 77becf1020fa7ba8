//! Human-readable output

use std::fmt::Write;

use application::CacheStats;
use domain::SearchResult;

/// Summary of an ESearch result, one identifier per line
pub fn search_summary(result: &SearchResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} record(s) found, showing {} from offset {}",
        result.count,
        result.idlist.len(),
        result.retstart
    );
    if let Some(translation) = &result.querytranslation {
        let _ = writeln!(out, "Query: {translation}");
    }
    for id in &result.idlist {
        let _ = writeln!(out, "{id}");
    }
    if result.has_more_results() {
        let next = result.retstart + result.idlist.len() as u64;
        let _ = writeln!(out, "More results available (next --retstart {next})");
    }
    out
}

/// Cache statistics table
#[allow(clippy::cast_precision_loss)]
pub fn cache_stats(stats: &CacheStats, path: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cache: {path}");
    let _ = writeln!(out, "Entries: {}", stats.total_entries);
    let _ = writeln!(
        out,
        "Hits: {} ({:.2} per entry)",
        stats.total_hits,
        stats.hits_per_entry()
    );
    let _ = writeln!(
        out,
        "Stored: {:.2} MB (database {:.2} MB)",
        stats.size_bytes as f64 / 1_048_576.0,
        stats.database_bytes as f64 / 1_048_576.0
    );
    for (endpoint, endpoint_stats) in &stats.by_endpoint {
        let _ = writeln!(
            out,
            "  {endpoint:<14} {:>8} entries {:>8} hits",
            endpoint_stats.entries, endpoint_stats.hits
        );
    }
    out
}
