//! Google Custom Search searcher.
//!
//! The only searcher that performs real HTTP. Without both an API key and an
//! engine id it returns an empty `Found` list; request or decode failures
//! become [`SearchOutcome::Unavailable`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::registry::{host_of, TrustedSourceRegistry};
use super::{SearchOutcome, Searcher};
use crate::config::schema::GoogleConfig;
use crate::error::{GuataError, Result};
use crate::observability::redact_secrets;
use crate::types::{clamp_confidence, SearchResult};

pub const CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Restricts every query to the state tourism portals.
pub const SITE_FILTER: &str = "site:ms.gov.br OR site:visitms.com.br OR site:fundtur.ms.gov.br";

const BASE_CONFIDENCE: f64 = 70.0;
const MAX_CONFIDENCE: f64 = 95.0;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
    #[serde(default)]
    error: Option<CseError>,
}

#[derive(Debug, Deserialize)]
struct CseError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    pagemap: Option<PageMap>,
}

#[derive(Debug, Default, Deserialize)]
struct PageMap {
    #[serde(default)]
    metatags: Vec<HashMap<String, serde_json::Value>>,
}

impl CseItem {
    fn metatag(&self, key: &str) -> Option<&str> {
        self.pagemap
            .as_ref()?
            .metatags
            .first()?
            .get(key)?
            .as_str()
            .filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Searcher
// ---------------------------------------------------------------------------

pub struct GoogleSearcher {
    client: reqwest::Client,
    endpoint: String,
    credentials: Option<(String, String)>,
    num: usize,
    registry: Arc<TrustedSourceRegistry>,
}

impl GoogleSearcher {
    pub fn new(
        config: &GoogleConfig,
        num: usize,
        timeout: Duration,
        registry: Arc<TrustedSourceRegistry>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("guata/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: CSE_ENDPOINT.to_string(),
            credentials: config
                .credentials()
                .map(|(k, cx)| (k.to_string(), cx.to_string())),
            num: num.clamp(1, 10),
            registry,
        })
    }

    /// Point at a different endpoint (local test servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn fetch(&self, key: &str, cx: &str, query: &str) -> Result<Vec<SearchResult>> {
        let restricted = format!("{query} {SITE_FILTER}");
        let num = self.num.to_string();
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("key", key), ("cx", cx), ("q", restricted.as_str()), ("num", num.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<CseResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(GuataError::Status {
                endpoint: "google-cse".to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let data: CseResponse = serde_json::from_str(&resp.text().await?)?;
        if let Some(err) = data.error {
            return Err(GuataError::Unavailable(format!("google-cse: {}", err.message)));
        }

        let category = detect_category(query);
        let now = Utc::now();
        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(data.items.len());
        for item in data.items {
            if item.link.is_empty() {
                continue;
            }
            let source = host_of(&item.link);
            if !seen.insert((item.title.clone(), source.clone())) {
                continue;
            }
            let confidence = google_confidence(&item);
            let last_verified = item
                .metatag("article:modified_time")
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or(now);
            results.push(SearchResult {
                title: item.title,
                content: item.snippet,
                reliability: self.registry.reliability_for(&item.link),
                is_official: self.registry.is_official(&item.link),
                url: item.link,
                source,
                confidence,
                cross_references: 0,
                last_verified,
                categories: BTreeSet::from([category.to_string()]),
            });
        }
        Ok(results)
    }
}

#[async_trait]
impl Searcher for GoogleSearcher {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        let Some((key, cx)) = self.credentials.as_ref() else {
            tracing::debug!("Google Custom Search not configured, skipping");
            return SearchOutcome::Found(Vec::new());
        };

        match self.fetch(key, cx, query).await {
            Ok(results) => {
                tracing::debug!(found = results.len(), "google search");
                SearchOutcome::Found(results)
            }
            Err(e) => {
                let reason = redact_secrets(&e.to_string());
                tracing::warn!("Google Custom Search failed: {reason}");
                SearchOutcome::Unavailable(reason)
            }
        }
    }
}

/// 70 base, +10 when the page carries a modification time, +5 for an
/// `og:type`, +5 for a description; capped at 95.
fn google_confidence(item: &CseItem) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if item.metatag("article:modified_time").is_some() {
        confidence += 10.0;
    }
    if item.metatag("og:type").is_some() {
        confidence += 5.0;
    }
    if item.metatag("description").is_some() || item.metatag("og:description").is_some() {
        confidence += 5.0;
    }
    clamp_confidence(confidence.min(MAX_CONFIDENCE))
}

/// Coarse topic of a query, attached as the candidate's category.
pub fn detect_category(query: &str) -> &'static str {
    let q = query.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| q.contains(w));
    if has(&["hotel", "hospedagem"]) {
        "accommodation"
    } else if has(&["restaurante", "comida"]) {
        "food"
    } else if has(&["pantanal", "natureza"]) {
        "nature"
    } else if has(&["bonito", "gruta"]) {
        "ecotourism"
    } else if has(&["evento", "show"]) {
        "events"
    } else if has(&["campo grande", "cidade"]) {
        "city"
    } else {
        "general"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
