//! The dynamic search engine: cache lookup, concurrent fan-out with a
//! per-searcher timeout, aggregation, cache fill.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;

use super::aggregator;
use super::cache::{cache_key, CacheStats, ResultCache};
use super::google::GoogleSearcher;
use super::registry::TrustedSourceRegistry;
use super::searchers::template_searchers;
use super::{SearchOutcome, Searcher};
use crate::config::schema::GuataConfig;
use crate::error::Result;
use crate::observability::SearchMetrics;
use crate::types::{SearchAnalysis, SearchResult};

#[derive(Debug, Clone, Serialize)]
pub struct SearchStats {
    #[serde(flatten)]
    pub cache: CacheStats,
    pub searchers: Vec<String>,
    pub metrics: serde_json::Value,
}

pub struct DynamicWebSearch {
    searchers: Vec<Arc<dyn Searcher>>,
    cache: ResultCache,
    searcher_timeout: Duration,
    registry: Arc<TrustedSourceRegistry>,
    metrics: Arc<SearchMetrics>,
}

impl DynamicWebSearch {
    pub fn new(
        searchers: Vec<Arc<dyn Searcher>>,
        cache: ResultCache,
        searcher_timeout: Duration,
    ) -> Self {
        Self {
            searchers,
            cache,
            searcher_timeout,
            registry: Arc::new(TrustedSourceRegistry::builtin()),
            metrics: Arc::new(SearchMetrics::new()),
        }
    }

    /// Template searchers plus Google Custom Search, with the trusted
    /// source table from `trusted_sources_path` when set.
    pub fn from_config(config: &GuataConfig) -> Result<Self> {
        let registry = Arc::new(TrustedSourceRegistry::load(
            config.trusted_sources_path.as_deref(),
        )?);
        let mut searchers = template_searchers();
        let google = GoogleSearcher::new(
            &config.google,
            config.search.google_results,
            config.search.searcher_timeout(),
            Arc::clone(&registry),
        )?;
        searchers.push(Arc::new(google));

        tracing::debug!(
            searchers = searchers.len(),
            trusted_sources = registry.len(),
            "search engine ready"
        );
        Ok(Self {
            searchers,
            cache: ResultCache::from_config(&config.cache),
            searcher_timeout: config.search.searcher_timeout(),
            registry,
            metrics: Arc::new(SearchMetrics::new()),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<SearchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn registry(&self) -> &TrustedSourceRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<SearchMetrics> {
        &self.metrics
    }

    pub fn searcher_names(&self) -> Vec<String> {
        self.searchers.iter().map(|s| s.name().to_string()).collect()
    }

    /// Search every source, or return the cached analysis for the same
    /// normalized query. Never fails.
    ///
    /// Analyses built while a searcher was unavailable are returned but not
    /// cached.
    pub async fn search(&self, query: &str) -> Arc<SearchAnalysis> {
        self.metrics.record_query();
        let key = cache_key(query);

        if let Some(hit) = self.cache.get(&key) {
            self.metrics.record_cache_hit();
            tracing::debug!(query, "search cache hit");
            return hit;
        }
        self.metrics.record_cache_miss();

        let (candidates, unavailable) = self.fan_out(query).await;
        let mut analysis = aggregator::aggregate(query, candidates, Utc::now());

        tracing::info!(
            query,
            results = analysis.results.len(),
            confidence = analysis.confidence,
            unavailable = unavailable.len(),
            "dynamic search"
        );

        if unavailable.is_empty() {
            return self.cache.insert(key, analysis);
        }
        self.metrics.record_unavailable(unavailable.len());
        analysis.unavailable_sources = unavailable;
        Arc::new(analysis)
    }

    async fn fan_out(&self, query: &str) -> (Vec<SearchResult>, Vec<String>) {
        let timeout = self.searcher_timeout;
        let calls = self.searchers.iter().map(|searcher| async move {
            let outcome = match tokio::time::timeout(timeout, searcher.search(query)).await {
                Ok(outcome) => outcome,
                Err(_) => SearchOutcome::Unavailable("timed out".to_string()),
            };
            (searcher.name().to_string(), outcome)
        });

        let mut candidates = Vec::new();
        let mut unavailable = Vec::new();
        for (name, outcome) in join_all(calls).await {
            match outcome {
                SearchOutcome::Found(results) => candidates.extend(results),
                SearchOutcome::Unavailable(reason) => {
                    tracing::warn!(searcher = %name, %reason, "searcher unavailable");
                    unavailable.push(name);
                }
            }
        }
        (candidates, unavailable)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("search cache cleared");
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            cache: self.cache.stats(),
            searchers: self.searcher_names(),
            metrics: self.metrics.to_json(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
