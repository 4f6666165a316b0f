//! Multi-source dynamic search.
//!
//! A query fans out to every registered [`Searcher`], the candidates are
//! re-scored and folded into a [`SearchAnalysis`](crate::types::SearchAnalysis)
//! by the [`aggregator`], and the analysis is cached per normalized query.
//!
//! Searchers report [`SearchOutcome::Unavailable`] instead of failing, so the
//! engine can tell "nothing found" from "could not search" while the caller
//! still always gets an analysis.

pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod engine;
pub mod google;
pub mod registry;
pub mod searchers;

use async_trait::async_trait;

use crate::types::SearchResult;

pub use engine::DynamicWebSearch;

/// Result of one searcher call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The searcher ran; the list may be empty.
    Found(Vec<SearchResult>),
    /// The searcher could not run (HTTP failure, decode error, timeout).
    Unavailable(String),
}

impl SearchOutcome {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn results(&self) -> &[SearchResult] {
        match self {
            Self::Found(results) => results,
            Self::Unavailable(_) => &[],
        }
    }

    pub fn into_results(self) -> Vec<SearchResult> {
        match self {
            Self::Found(results) => results,
            Self::Unavailable(_) => Vec::new(),
        }
    }
}

/// One candidate source.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Stable short name used in logs and `unavailable_sources`.
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> SearchOutcome;
}
