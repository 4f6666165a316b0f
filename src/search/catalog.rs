//! Keyword-triggered candidate templates.
//!
//! Each template searcher is a static table of [`Template`]s. A template
//! fires when any of its [`Trigger`]s matches the normalized query; a
//! template marked `when_unmatched` also fires when nothing else in its
//! table did.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::types::{Reliability, SearchResult};

/// Keyword condition over a normalized query.
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    /// Fires when any keyword occurs.
    Any(&'static [&'static str]),
    /// Fires when every keyword occurs.
    All(&'static [&'static str]),
}

impl Trigger {
    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            Self::Any(words) => words.iter().any(|w| normalized.contains(w)),
            Self::All(words) => !words.is_empty() && words.iter().all(|w| normalized.contains(w)),
        }
    }
}

/// A hand-written candidate and the triggers that select it.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub triggers: &'static [Trigger],
    pub when_unmatched: bool,
    pub title: &'static str,
    pub url: &'static str,
    pub content: &'static str,
    pub source: &'static str,
    pub reliability: Reliability,
    pub confidence: f64,
    pub is_official: bool,
    pub categories: &'static [&'static str],
}

impl Template {
    pub fn matches(&self, normalized: &str) -> bool {
        self.triggers.iter().any(|t| t.matches(normalized))
    }

    pub fn to_result(&self, now: DateTime<Utc>) -> SearchResult {
        SearchResult {
            title: self.title.to_string(),
            content: self.content.to_string(),
            url: self.url.to_string(),
            source: self.source.to_string(),
            reliability: self.reliability,
            confidence: self.confidence,
            cross_references: 1,
            last_verified: now,
            is_official: self.is_official,
            categories: self
                .categories
                .iter()
                .map(|c| c.to_string())
                .collect::<BTreeSet<_>>(),
        }
    }
}

/// Lowercase, replace punctuation with spaces, collapse whitespace, and pad
/// with one space on each side so keywords like `" ms "` match whole words.
pub fn normalize_query(query: &str) -> String {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    format!(" {collapsed} ")
}

/// Evaluate a template table against a raw query.
pub fn select(table: &[Template], query: &str, now: DateTime<Utc>) -> Vec<SearchResult> {
    let normalized = normalize_query(query);
    let mut results: Vec<SearchResult> = table
        .iter()
        .filter(|t| t.matches(&normalized))
        .map(|t| t.to_result(now))
        .collect();

    if results.is_empty() {
        results.extend(
            table
                .iter()
                .filter(|t| t.when_unmatched)
                .map(|t| t.to_result(now)),
        );
    }
    results
}
