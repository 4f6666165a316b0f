//! End-to-end tests for the search and answer pipeline.
//!
//! Everything here runs without network access: edge functions are either
//! unconfigured, pointed at a local server that fails or stalls, or replaced
//! by in-process doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use chrono::Utc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use guata::chat::edge::SupabaseEdgeClient;
use guata::chat::replies::GREETINGS;
use guata::chat::GuataService;
use guata::config::loader::load_config;
use guata::config::schema::{ComposerConfig, EdgeConfig, GuataConfig};
use guata::search::aggregator::{aggregate, FallbackCategory};
use guata::search::cache::ResultCache;
use guata::search::searchers::{template_searchers, TemplateSearcher};
use guata::search::{DynamicWebSearch, SearchOutcome, Searcher};
use guata::types::AskRequest;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Edge functions that answer 500 on every call.
async fn failing_edge_config() -> EdgeConfig {
    let router = Router::new().route(
        "/functions/v1/{name}",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "internal") }),
    );
    EdgeConfig {
        base_url: Some(serve(router).await),
        anon_key: Some("anon".into()),
        ..EdgeConfig::default()
    }
}

/// Edge functions that never answer within the client timeout.
async fn stalled_edge_config() -> EdgeConfig {
    let router = Router::new().route(
        "/functions/v1/{name}",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "{}"
        }),
    );
    EdgeConfig {
        base_url: Some(serve(router).await),
        request_timeout_ms: 100,
        ..EdgeConfig::default()
    }
}

fn service_with_edge(edge: &EdgeConfig) -> GuataService {
    let client = SupabaseEdgeClient::new(edge).unwrap();
    let search = DynamicWebSearch::from_config(&GuataConfig::default()).unwrap();
    GuataService::new(
        Arc::new(client),
        Some(Arc::new(search)),
        ComposerConfig::default(),
    )
}

const PROMPTS: &[&str] = &[
    "oi",
    "",
    "   ",
    "horário do bioparque",
    "Qual a melhor época para o Pantanal?",
    "hotel barato em Bonito",
    "e lá?",
    "🦫🦫🦫",
];

// ===========================================================================
// 1. ask never fails and never returns blank text
// ===========================================================================

#[tokio::test]
async fn ask_survives_failing_edge_functions() {
    let service = service_with_edge(&failing_edge_config().await);
    for prompt in PROMPTS {
        let answer = service.ask(&AskRequest::new(*prompt)).await;
        assert!(!answer.trim().is_empty(), "blank answer for {prompt:?}");
    }
    assert!(service.metrics().remote_failures() > 0);
}

#[tokio::test]
async fn ask_survives_stalled_edge_functions() {
    let service = service_with_edge(&stalled_edge_config().await);
    let answer = tokio::time::timeout(
        Duration::from_secs(10),
        service.ask(&AskRequest::new("Onde comer sobá?")),
    )
    .await
    .expect("ask must finish once the client times out");
    assert!(!answer.trim().is_empty());
}

#[tokio::test]
async fn ask_offline_with_history() {
    let service = GuataService::from_config(&GuataConfig::default()).unwrap();
    let request = AskRequest::new("e quanto custa?").with_history(vec![
        "Quero ir para Bonito".into(),
        "Gruta do Lago Azul".into(),
    ]);
    assert!(!service.ask(&request).await.trim().is_empty());
}

// ===========================================================================
// 2. greeting
// ===========================================================================

#[tokio::test]
async fn oi_gets_one_of_the_fixed_greetings() {
    let service = GuataService::from_config(&GuataConfig::default()).unwrap();
    let mut seen = std::collections::HashSet::new();
    for _ in 0..30 {
        let answer = service.ask(&AskRequest::new("oi")).await;
        assert!(GREETINGS.contains(&answer.as_str()), "{answer}");
        seen.insert(answer);
    }
    assert!(!seen.is_empty());
}

// ===========================================================================
// 3. aggregator fallback
// ===========================================================================

#[test]
fn empty_candidates_fall_back_by_category() {
    let cases = [
        ("hotel em Bonito", FallbackCategory::Hotel, 60.0),
        ("onde comer bem", FallbackCategory::Food, 65.0),
        ("como chegar de ônibus", FallbackCategory::Transport, 70.0),
        ("me conte algo", FallbackCategory::Generic, 55.0),
    ];
    for (query, category, confidence) in cases {
        let analysis = aggregate(query, Vec::new(), Utc::now());
        assert_eq!(FallbackCategory::detect(query), category, "{query}");
        assert_eq!(analysis.confidence, confidence, "{query}");
        assert_eq!(analysis.best_answer, category.answer());
    }
}

// ===========================================================================
// 4. cache hit
// ===========================================================================

struct Counting {
    calls: AtomicUsize,
}

#[async_trait]
impl Searcher for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TemplateSearcher::official().search(query).await
    }
}

#[tokio::test]
async fn same_normalized_query_hits_cache() {
    let counting = Arc::new(Counting {
        calls: AtomicUsize::new(0),
    });
    let searchers: Vec<Arc<dyn Searcher>> = vec![counting.clone()];
    let engine = DynamicWebSearch::new(
        searchers,
        ResultCache::new(8, Duration::from_secs(60)),
        Duration::from_secs(1),
    );

    let first = engine.search("Horário do Bioparque?").await;
    let second = engine.search("horário do bioparque").await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

    engine.clear_cache();
    let third = engine.search("horário do bioparque").await;
    assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    assert_eq!(first.best_answer, third.best_answer);
}

// ===========================================================================
// 5. official searcher and the bioparque scenario
// ===========================================================================

#[tokio::test]
async fn bioparque_has_official_candidate() {
    let outcome = TemplateSearcher::official().search("bioparque").await;
    assert!(outcome
        .results()
        .iter()
        .any(|r| r.is_official && r.source.contains("bioparque.com.br")));
}

#[tokio::test]
async fn bioparque_hours_offline_scenario() {
    let engine = DynamicWebSearch::from_config(&GuataConfig::default()).unwrap();
    let analysis = engine.search("horário do bioparque").await;
    assert!((55.0..=100.0).contains(&analysis.confidence));
    assert!(!analysis.best_answer.trim().is_empty());
    assert!(analysis
        .sources
        .iter()
        .any(|s| s.contains(".gov.br") || s.contains("bioparque")));
    assert_eq!(engine.searcher_names().len(), template_searchers().len() + 1);
}

// ===========================================================================
// 6. config files
// ===========================================================================

#[tokio::test]
async fn project_config_replaces_trusted_sources() {
    let dir = TempDir::new().unwrap();
    let sources = dir.path().join("sources.yaml");
    std::fs::write(
        &sources,
        "sources:\n  - name: Bioparque\n    domain: bioparque.com.br\n    priority: 9\n    category: official\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join(".guata.yaml"),
        format!(
            "cache:\n  capacity: 2\nsearch:\n  searcher_timeout_ms: 250\ntrusted_sources_path: {}\n",
            sources.display()
        ),
    )
    .unwrap();

    let config = load_config(None, Some(dir.path())).unwrap();
    assert_eq!(config.cache.capacity, 2);
    assert_eq!(config.search.searcher_timeout_ms, 250);

    let engine = DynamicWebSearch::from_config(&config).unwrap();
    assert_eq!(engine.registry().len(), 1);
    assert!(engine.registry().is_trusted("https://www.bioparque.com.br/x"));
    assert!(!engine.registry().is_trusted("https://fundtur.ms.gov.br"));
}
