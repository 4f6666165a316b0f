//! Trusted source registry.
//!
//! A deduplicated map from domain to [`TrustedSource`], loaded once at
//! startup from YAML (the built-in table or a configured override). Used to
//! tag candidates coming from open web search: trusted official domains
//! become `is_official`, trusted domains get `high` reliability.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_TRUSTED_SOURCES_YAML;
use crate::error::Result;
use crate::types::Reliability;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Official,
    Tourism,
    News,
    Business,
}

impl SourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Tourism => "tourism",
            Self::News => "news",
            Self::Business => "business",
        }
    }
}

impl std::fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedSource {
    pub name: String,
    pub domain: String,
    pub priority: u8,
    pub category: SourceCategory,
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    sources: Vec<TrustedSource>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TrustedSourceRegistry {
    by_domain: HashMap<String, TrustedSource>,
}

impl TrustedSourceRegistry {
    /// The table shipped with the crate. Empty if it fails to parse.
    pub fn builtin() -> Self {
        Self::from_yaml(DEFAULT_TRUSTED_SOURCES_YAML).unwrap_or_else(|e| {
            tracing::error!("built-in trusted source table is invalid: {e}");
            Self::default()
        })
    }

    /// Load from `path` when given, otherwise the built-in table.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_yaml(&std::fs::read_to_string(p)?),
            None => Ok(Self::builtin()),
        }
    }

    /// Parse a `sources:` list. Domains are normalised to lowercase; on
    /// duplicates the entry with the highest priority is kept.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: SourcesFile = serde_yaml::from_str(yaml)?;
        Ok(Self::from_sources(file.sources))
    }

    pub fn from_sources(sources: impl IntoIterator<Item = TrustedSource>) -> Self {
        let mut by_domain: HashMap<String, TrustedSource> = HashMap::new();
        for mut source in sources {
            source.domain = normalize_domain(&source.domain);
            if source.domain.is_empty() {
                continue;
            }
            match by_domain.get(&source.domain) {
                Some(existing) if existing.priority >= source.priority => {}
                _ => {
                    by_domain.insert(source.domain.clone(), source);
                }
            }
        }
        Self { by_domain }
    }

    pub fn len(&self) -> usize {
        self.by_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }

    /// Find the most specific trusted entry for a host or URL.
    ///
    /// `www.bonito.ms.gov.br` matches `bonito.ms.gov.br` before `ms.gov.br`.
    pub fn lookup(&self, host_or_url: &str) -> Option<&TrustedSource> {
        let host = host_of(host_or_url);
        let mut candidate = host.as_str();
        loop {
            if let Some(source) = self.by_domain.get(candidate) {
                return Some(source);
            }
            match candidate.find('.') {
                Some(idx) => candidate = &candidate[idx + 1..],
                None => return None,
            }
        }
    }

    pub fn is_trusted(&self, host_or_url: &str) -> bool {
        self.lookup(host_or_url).is_some()
    }

    pub fn is_official(&self, host_or_url: &str) -> bool {
        self.lookup(host_or_url)
            .map(|s| s.category == SourceCategory::Official)
            .unwrap_or(false)
    }

    /// Reliability tag for a candidate coming from `host_or_url`.
    pub fn reliability_for(&self, host_or_url: &str) -> Reliability {
        match self.lookup(host_or_url) {
            Some(s) if s.priority >= 7 => Reliability::High,
            Some(_) => Reliability::Medium,
            None => Reliability::Low,
        }
    }

    /// All entries, highest priority first, then by domain.
    pub fn sorted(&self) -> Vec<&TrustedSource> {
        let mut all: Vec<&TrustedSource> = self.by_domain.values().collect();
        all.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.domain.cmp(&b.domain)));
        all
    }
}

fn normalize_domain(domain: &str) -> String {
    domain
        .trim()
        .trim_start_matches("www.")
        .trim_end_matches('/')
        .to_lowercase()
}

/// Extract the bare host from a URL or a host-ish label like
/// `instagram.com/visitms`.
pub fn host_of(host_or_url: &str) -> String {
    let trimmed = host_or_url.trim();
    if let Ok(parsed) = url::Url::parse(trimmed) {
        if let Some(host) = parsed.host_str() {
            return normalize_domain(host);
        }
    }
    let without_path = trimmed.split('/').next().unwrap_or(trimmed);
    normalize_domain(without_path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
