//! Structured logging, observability, and secret redaction.
//!
//! This module provides:
//! - [`init_logging`]: One-time structured logging setup with `RUST_LOG` support
//! - [`redact_secrets`]: Secret pattern redaction for URLs and log lines
//! - [`SearchMetrics`]: Lock-free counters for the search pipeline

use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use tracing_subscriber::EnvFilter;

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `guata=info` when `RUST_LOG` is not set. Logs go to stderr so
/// the stdio MCP transport keeps stdout to itself. Subsequent calls are
/// silently ignored by `tracing_subscriber`.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("guata=info"));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Redact potential secrets from text.
///
/// Covers API keys passed as URL query parameters (`key=`, `apikey=`),
/// `apikey:` headers, and Bearer tokens. Matches are replaced with
/// `***REDACTED***`.
pub fn redact_secrets(text: &str) -> String {
    let patterns: &[(&str, &str)] = &[
        (
            r"([?&](?:key|api_key|apikey)=)[^&\s]+",
            "${1}***REDACTED***",
        ),
        (
            r#"(?i)(api[_-]?key|apikey)\s*[:=]\s*['"]?([a-zA-Z0-9_\-\.]{20,})['"]?"#,
            "$1=***REDACTED***",
        ),
        (
            r"(?i)Bearer\s+[a-zA-Z0-9_\-\.]{20,}",
            "Bearer ***REDACTED***",
        ),
    ];

    let mut result = text.to_string();
    for (pattern, replacement) in patterns {
        if let Ok(re) = Regex::new(pattern) {
            result = re.replace_all(&result, *replacement).to_string();
        }
    }
    result
}

/// Counters for the dynamic search pipeline.
///
/// Shared behind an `Arc` by the engine and the transports; every field is
/// atomic so concurrent requests can record without a lock.
#[derive(Debug, Default)]
pub struct SearchMetrics {
    queries: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    unavailable_searchers: AtomicU64,
    remote_failures: AtomicU64,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unavailable(&self, count: usize) {
        self.unavailable_searchers
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// A remote edge call (web RAG or generation) failed.
    pub fn record_remote_failure(&self) {
        self.remote_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn unavailable_searchers(&self) -> u64 {
        self.unavailable_searchers.load(Ordering::Relaxed)
    }

    pub fn remote_failures(&self) -> u64 {
        self.remote_failures.load(Ordering::Relaxed)
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits();
        let total = hits + self.cache_misses();
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "queries": self.queries(),
            "cache_hits": self.cache_hits(),
            "cache_misses": self.cache_misses(),
            "cache_hit_rate": self.cache_hit_rate(),
            "unavailable_searchers": self.unavailable_searchers(),
            "remote_failures": self.remote_failures(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
