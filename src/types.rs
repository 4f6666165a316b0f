//! Core domain types for Guatá.
//!
//! Candidates ([`SearchResult`]) are created fresh per query by a searcher,
//! adjusted once by the aggregator, and folded into a [`SearchAnalysis`].
//! Knowledge items are what the composer hands to the generation endpoint.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reliability
// ---------------------------------------------------------------------------

/// Coarse trust tag attached to a candidate by the searcher that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reliability {
    High,
    Medium,
    Low,
}

impl Reliability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Reliability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category tags
// ---------------------------------------------------------------------------

/// Tag marking a candidate as checked against a curated fact table.
pub const TAG_VERIFIED: &str = "verified";
/// Tag marking a candidate that comes from the structured data searcher.
pub const TAG_REAL_DATA: &str = "real-data";

// ---------------------------------------------------------------------------
// SearchResult
// ---------------------------------------------------------------------------

/// One candidate answer snippet with provenance and a 0–100 confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub content: String,
    pub url: String,
    /// Source label, usually a bare domain such as `bonito.ms.gov.br`.
    pub source: String,
    pub reliability: Reliability,
    pub confidence: f64,
    pub cross_references: u32,
    pub last_verified: DateTime<Utc>,
    pub is_official: bool,
    pub categories: BTreeSet<String>,
}

impl SearchResult {
    pub fn has_category(&self, tag: &str) -> bool {
        self.categories.contains(tag)
    }
}

/// Clamp a score into `[0, 100]`, mapping NaN to zero.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

// ---------------------------------------------------------------------------
// SearchAnalysis
// ---------------------------------------------------------------------------

/// Response envelope of a dynamic web search. Cached per normalized query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalysis {
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Never empty.
    pub best_answer: String,
    pub confidence: f64,
    pub sources: Vec<String>,
    pub analysis: String,
    /// Searchers that failed or timed out while building this analysis.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable_sources: Vec<String>,
}

// ---------------------------------------------------------------------------
// Knowledge items
// ---------------------------------------------------------------------------

/// A document in the knowledge base passed to the generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeItem {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn default_source() -> String {
    "web".to_string()
}

impl From<&SearchResult> for KnowledgeItem {
    fn from(r: &SearchResult) -> Self {
        Self {
            id: r.url.clone(),
            title: r.title.clone(),
            content: r.content.clone(),
            source: r.source.clone(),
            last_updated: r.last_verified,
            url: Some(r.url.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Ask request
// ---------------------------------------------------------------------------

/// Persona the generation endpoint should answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Public tourist-facing chat.
    #[default]
    Tourist,
    /// Attendant at a tourist assistance center.
    Cat,
}

impl ChatMode {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tourist" | "turista" => Some(Self::Tourist),
            "cat" => Some(Self::Cat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tourist => "tourist",
            Self::Cat => "cat",
        }
    }
}

/// Input of [`GuataService::ask`](crate::chat::composer::GuataService::ask).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub prompt: String,
    #[serde(default)]
    pub knowledge_base: Vec<KnowledgeItem>,
    #[serde(default)]
    pub user_info: Option<serde_json::Value>,
    #[serde(default)]
    pub mode: ChatMode,
    #[serde(default)]
    pub conversation_history: Vec<String>,
}

impl AskRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.conversation_history = history;
        self
    }

    pub fn with_knowledge_base(mut self, kb: Vec<KnowledgeItem>) -> Self {
        self.knowledge_base = kb;
        self
    }

    pub fn with_mode(mut self, mode: ChatMode) -> Self {
        self.mode = mode;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
