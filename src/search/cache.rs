//! Bounded LRU + TTL cache of search analyses keyed by normalized query.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;

use crate::config::schema::CacheConfig;
use crate::types::SearchAnalysis;

/// Lowercase and keep alphanumeric characters only, so
/// `"Horário do Bioparque?"` and `"horario do bioparque"` differ only by the
/// accent.
pub fn cache_key(query: &str) -> String {
    query
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

struct Entry {
    analysis: Arc<SearchAnalysis>,
    inserted_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub cache_size: usize,
    pub total_searches: usize,
    /// Mean confidence of every cached candidate, rounded.
    pub average_confidence: f64,
}

pub struct ResultCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl ResultCache {
    /// A zero capacity is raised to one. A zero TTL expires entries
    /// immediately.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl())
    }

    pub fn get(&self, key: &str) -> Option<Arc<SearchAnalysis>> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Arc<SearchAnalysis>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match entries.peek(key) {
            Some(entry) => now.saturating_duration_since(entry.inserted_at) >= self.ttl,
            None => return None,
        };
        if expired {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|e| Arc::clone(&e.analysis))
    }

    /// Store an analysis and return the shared handle later hits will see.
    pub fn insert(&self, key: String, analysis: SearchAnalysis) -> Arc<SearchAnalysis> {
        let analysis = Arc::new(analysis);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(
            key,
            Entry {
                analysis: Arc::clone(&analysis),
                inserted_at: Instant::now(),
            },
        );
        analysis
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let (sum, count) = entries
            .iter()
            .flat_map(|(_, e)| e.analysis.results.iter())
            .fold((0.0, 0usize), |(sum, n), r| (sum + r.confidence, n + 1));
        CacheStats {
            cache_size: entries.len(),
            total_searches: entries.len(),
            average_confidence: if count == 0 {
                0.0
            } else {
                (sum / count as f64).round()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Reliability, SearchResult};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use test_case::test_case;

    fn analysis(query: &str, confidences: &[f64]) -> SearchAnalysis {
        SearchAnalysis {
            query: query.to_string(),
            results: confidences
                .iter()
                .map(|&c| SearchResult {
                    title: "t".into(),
                    content: "c".into(),
                    url: "https://x".into(),
                    source: "x".into(),
                    reliability: Reliability::Low,
                    confidence: c,
                    cross_references: 0,
                    last_verified: Utc::now(),
                    is_official: false,
                    categories: BTreeSet::new(),
                })
                .collect(),
            best_answer: "a".into(),
            confidence: 55.0,
            sources: vec![],
            analysis: String::new(),
            unavailable_sources: vec![],
        }
    }

    #[test_case("Horário do Bioparque?", "horáriodobioparque" ; "keeps accented letters")]
    #[test_case("  BONITO  ", "bonito" ; "trims and lowercases")]
    #[test_case("3 dias!", "3dias" ; "keeps digits")]
    #[test_case("?!", "" ; "punctuation only")]
    fn keys(query: &str, expected: &str) {
        assert_eq!(cache_key(query), expected);
    }

    #[test]
    fn hit_returns_same_arc() {
        let cache = ResultCache::new(4, Duration::from_secs(60));
        let stored = cache.insert("bonito".into(), analysis("bonito", &[50.0]));
        let hit = cache.get("bonito").expect("cached");
        assert!(Arc::ptr_eq(&stored, &hit));
        assert!(cache.get("pantanal").is_none());
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = ResultCache::new(4, Duration::from_secs(60));
        cache.insert("bonito".into(), analysis("bonito", &[]));
        let later = Instant::now() + Duration::from_secs(61);
        assert!(cache.get_at("bonito", later).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = ResultCache::new(2, Duration::from_secs(60));
        cache.insert("a".into(), analysis("a", &[]));
        cache.insert("b".into(), analysis("b", &[]));
        assert!(cache.get("a").is_some());
        cache.insert("c".into(), analysis("c", &[]));
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let cache = ResultCache::new(0, Duration::from_secs(60));
        cache.insert("a".into(), analysis("a", &[]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_wipes_everything() {
        let cache = ResultCache::new(4, Duration::from_secs(60));
        cache.insert("a".into(), analysis("a", &[]));
        cache.insert("b".into(), analysis("b", &[]));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn stats_average_all_cached_candidates() {
        let cache = ResultCache::new(4, Duration::from_secs(60));
        assert_eq!(cache.stats().average_confidence, 0.0);
        cache.insert("a".into(), analysis("a", &[40.0, 60.0]));
        cache.insert("b".into(), analysis("b", &[81.0]));
        let stats = cache.stats();
        assert_eq!(stats.cache_size, 2);
        assert_eq!(stats.total_searches, 2);
        assert_eq!(stats.average_confidence, 60.0);
    }
}
