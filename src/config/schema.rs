//! Configuration data structures for Guatá.
//!
//! Defines the YAML config format: edge function endpoint, Google Custom
//! Search credentials, result cache bounds, searcher timeouts and composer
//! thresholds. Every field has a default so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for Guatá.
///
/// Loaded from YAML files and environment variables. Multiple sources are
/// merged with well-defined priority (see [`crate::config::loader`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuataConfig {
    /// Hosted edge functions (`guata-ai`, `guata-web-rag`).
    #[serde(default)]
    pub edge: EdgeConfig,

    /// Google Custom Search credentials.
    #[serde(default)]
    pub google: GoogleConfig,

    /// Dynamic search result cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Searcher fan-out tuning.
    #[serde(default)]
    pub search: SearchConfig,

    /// Answer composer thresholds.
    #[serde(default)]
    pub composer: ComposerConfig,

    /// Optional YAML file replacing the built-in trusted source table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_sources_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// EdgeConfig
// ---------------------------------------------------------------------------

/// Where the hosted edge functions live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`. `None` disables
    /// both remote calls and the composer runs on local tiers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Anonymous API key sent as bearer token and `apikey` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,

    #[serde(default = "default_generation_function")]
    pub generation_function: String,

    #[serde(default = "default_web_rag_function")]
    pub web_rag_function: String,

    /// State code sent to the web RAG function.
    #[serde(default = "default_state_code")]
    pub state_code: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            anon_key: None,
            generation_function: default_generation_function(),
            web_rag_function: default_web_rag_function(),
            state_code: default_state_code(),
            max_results: default_max_results(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl EdgeConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url
            .as_deref()
            .map(|u| !u.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// GoogleConfig
// ---------------------------------------------------------------------------

/// Google Custom Search credentials. Both must be present for the CSE
/// searcher to make a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,
}

impl GoogleConfig {
    /// Returns `(key, cx)` when both credentials are non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        let cx = self.engine_id.as_deref().filter(|c| !c.trim().is_empty())?;
        Some((key, cx))
    }
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

/// Bounds of the dynamic search cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached analyses (LRU eviction beyond this).
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry lifetime in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// SearchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Per-searcher timeout; a searcher that exceeds it is reported
    /// unavailable and the join proceeds without it.
    #[serde(default = "default_searcher_timeout_ms")]
    pub searcher_timeout_ms: u64,

    /// Number of results requested from Google Custom Search.
    #[serde(default = "default_google_results")]
    pub google_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            searcher_timeout_ms: default_searcher_timeout_ms(),
            google_results: default_google_results(),
        }
    }
}

impl SearchConfig {
    pub fn searcher_timeout(&self) -> Duration {
        Duration::from_millis(self.searcher_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// ComposerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Fetch web context before generating. Always on in production.
    #[serde(default = "default_true")]
    pub fetch_web_context: bool,

    /// Also consult the local multi-source search engine.
    #[serde(default = "default_true")]
    pub use_local_search: bool,

    /// Minimum adjusted confidence for a local candidate to count as a source.
    #[serde(default = "default_min_source_confidence")]
    pub min_source_confidence: f64,

    /// Minimum analysis confidence for the local best answer to be used
    /// as a direct answer.
    #[serde(default = "default_direct_answer_confidence")]
    pub direct_answer_confidence: f64,

    /// Remote RAG confidence (0–1) below which a clarifying question is asked.
    #[serde(default = "default_clarify_below")]
    pub clarify_below: f64,

    /// Number of history turns appended by the query rewriter.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            fetch_web_context: true,
            use_local_search: true,
            min_source_confidence: default_min_source_confidence(),
            direct_answer_confidence: default_direct_answer_confidence(),
            clarify_below: default_clarify_below(),
            history_turns: default_history_turns(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_generation_function() -> String {
    "guata-ai".to_string()
}

fn default_web_rag_function() -> String {
    "guata-web-rag".to_string()
}

fn default_state_code() -> String {
    "MS".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

fn default_cache_capacity() -> usize {
    256
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_searcher_timeout_ms() -> u64 {
    5_000
}

fn default_google_results() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_min_source_confidence() -> f64 {
    20.0
}

fn default_direct_answer_confidence() -> f64 {
    70.0
}

fn default_clarify_below() -> f64 {
    0.4
}

fn default_history_turns() -> usize {
    3
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
