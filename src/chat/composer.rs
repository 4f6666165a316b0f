//! The answer composer.
//!
//! `ask` walks a fixed chain of tiers and returns the first usable text:
//!
//! 1. rewrite the question with recent history
//! 2. gather web context (remote web RAG and local search, concurrently)
//! 3. remote generation over the merged knowledge base
//! 4. direct answer from the web context
//! 5. source summary plus a clarifying question
//! 6. clarifying question when the remote confidence is low
//! 7. local narrative
//!
//! No tier is fatal; remote failures are logged and skipped.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use super::edge::{edge_from_config, EdgeFunctions, GenerationRequest, WebContext};
use super::replies::{clarifying_question, enhance_direct_answer, narrative, summarize_sources};
use super::rewriter::rewrite_query_with;
use crate::config::schema::{ComposerConfig, GuataConfig};
use crate::error::{GuataError, Result};
use crate::observability::SearchMetrics;
use crate::search::DynamicWebSearch;
use crate::types::{AskRequest, KnowledgeItem};

pub const RAG_ANSWER_ID: &str = "rag-answer";
const RAG_ANSWER_TITLE: &str = "Resposta RAG (web consolidada)";
const RAG_ANSWER_SOURCE: &str = "rag";

pub struct GuataService {
    edge: Arc<dyn EdgeFunctions>,
    search: Option<Arc<DynamicWebSearch>>,
    config: ComposerConfig,
    metrics: Arc<SearchMetrics>,
}

impl GuataService {
    pub fn new(
        edge: Arc<dyn EdgeFunctions>,
        search: Option<Arc<DynamicWebSearch>>,
        config: ComposerConfig,
    ) -> Self {
        let metrics = search
            .as_ref()
            .map(|s| Arc::clone(s.metrics()))
            .unwrap_or_default();
        Self {
            edge,
            search,
            config,
            metrics,
        }
    }

    pub fn from_config(config: &GuataConfig) -> Result<Self> {
        let edge = edge_from_config(&config.edge)?;
        let search = if config.composer.use_local_search {
            Some(Arc::new(DynamicWebSearch::from_config(config)?))
        } else {
            None
        };
        Ok(Self::new(edge, search, config.composer.clone()))
    }

    pub fn search_engine(&self) -> Option<&Arc<DynamicWebSearch>> {
        self.search.as_ref()
    }

    pub fn metrics(&self) -> &Arc<SearchMetrics> {
        &self.metrics
    }

    /// Answer a tourist question. Never fails and never returns blank text.
    pub async fn ask(&self, request: &AskRequest) -> String {
        let history = &request.conversation_history;
        let rewritten = rewrite_query_with(&request.prompt, history, self.config.history_turns);
        tracing::debug!(prompt = %request.prompt, %rewritten, "ask");

        let context = if self.config.fetch_web_context {
            self.web_context(&rewritten).await
        } else {
            WebContext::default()
        };

        let knowledge_base = merge_knowledge_base(&request.knowledge_base, &context);
        let generation = GenerationRequest::new(
            &rewritten,
            &knowledge_base,
            request.user_info.as_ref(),
            history,
            request.mode,
        );
        match self.edge.generate(&generation).await {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!(tier = "generation", "answer composed");
                return text;
            }
            Ok(_) => tracing::debug!("generation returned empty text"),
            Err(e) => self.remote_failed("generation", &e),
        }

        if let Some(answer) = context.direct_answer() {
            tracing::info!(tier = "direct", "answer composed");
            return enhance_direct_answer(answer);
        }

        if !context.sources.is_empty() {
            tracing::info!(tier = "summary", sources = context.sources.len(), "answer composed");
            let summary = summarize_sources(&context.sources);
            return format!("{summary}\n\n{}", clarifying_question(&request.prompt))
                .trim()
                .to_string();
        }

        if context
            .confidence
            .is_some_and(|c| c < self.config.clarify_below)
        {
            tracing::info!(tier = "clarify", "answer composed");
            return clarifying_question(&request.prompt).to_string();
        }

        tracing::info!(tier = "narrative", "answer composed");
        narrative(&request.prompt, &mut rand::thread_rng())
    }

    /// Remote web RAG and local search, joined. Either side failing leaves
    /// the other intact.
    pub async fn web_context(&self, question: &str) -> WebContext {
        let (remote, local) = tokio::join!(
            self.edge.web_rag(question),
            self.local_context(question)
        );

        let remote = remote.unwrap_or_else(|e| {
            self.remote_failed("web-rag", &e);
            WebContext::default()
        });
        merge_contexts(remote, local)
    }

    async fn local_context(&self, question: &str) -> WebContext {
        let Some(search) = &self.search else {
            return WebContext::default();
        };
        let analysis = search.search(question).await;

        let sources = analysis
            .results
            .iter()
            .filter(|r| r.confidence >= self.config.min_source_confidence)
            .map(KnowledgeItem::from)
            .collect();
        let answer = (!analysis.results.is_empty()
            && analysis.confidence >= self.config.direct_answer_confidence)
            .then(|| analysis.best_answer.clone());

        WebContext {
            sources,
            answer,
            confidence: None,
        }
    }

    fn remote_failed(&self, call: &str, err: &GuataError) {
        match err {
            GuataError::Unavailable(reason) => {
                tracing::debug!(call, %reason, "edge function skipped");
            }
            other => {
                self.metrics.record_remote_failure();
                tracing::warn!(call, error = %other, "edge function failed, falling back");
            }
        }
    }
}

/// Remote sources first, then local ones not already present by
/// `(title, source)`. The remote answer wins when both exist.
fn merge_contexts(remote: WebContext, local: WebContext) -> WebContext {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut sources = Vec::with_capacity(remote.sources.len() + local.sources.len());
    for item in remote.sources.into_iter().chain(local.sources) {
        if seen.insert((item.title.clone(), item.source.clone())) {
            sources.push(item);
        }
    }
    let answer = remote
        .answer
        .filter(|a| !a.trim().is_empty())
        .or(local.answer.filter(|a| !a.trim().is_empty()));

    WebContext {
        sources,
        answer,
        confidence: remote.confidence,
    }
}

/// Request knowledge base, then web sources, then the consolidated answer
/// as a document of its own.
fn merge_knowledge_base(base: &[KnowledgeItem], context: &WebContext) -> Vec<KnowledgeItem> {
    let mut kb = Vec::with_capacity(base.len() + context.sources.len() + 1);
    kb.extend_from_slice(base);
    kb.extend(context.sources.iter().cloned());
    if let Some(answer) = context.direct_answer() {
        kb.push(KnowledgeItem {
            id: RAG_ANSWER_ID.to_string(),
            title: RAG_ANSWER_TITLE.to_string(),
            content: answer.to_string(),
            source: RAG_ANSWER_SOURCE.to_string(),
            last_updated: Utc::now(),
            url: None,
        });
    }
    kb
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::edge::OfflineEdge;
    use crate::chat::replies::{FOLLOW_UP_SUFFIX, GREETINGS};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Edge double with canned outcomes; records knowledge base ids sent
    /// to generation.
    struct Scripted {
        rag: fn() -> Result<WebContext>,
        generation: fn() -> Result<String>,
        seen_kb: Mutex<Vec<String>>,
        seen_prompt: Mutex<String>,
    }

    impl Scripted {
        fn new(rag: fn() -> Result<WebContext>, generation: fn() -> Result<String>) -> Self {
            Self {
                rag,
                generation,
                seen_kb: Mutex::new(Vec::new()),
                seen_prompt: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl EdgeFunctions for Scripted {
        async fn web_rag(&self, _question: &str) -> Result<WebContext> {
            (self.rag)()
        }

        async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
            *self.seen_kb.lock().unwrap() =
                request.knowledge_base.iter().map(|d| d.id.to_string()).collect();
            *self.seen_prompt.lock().unwrap() = request.prompt.to_string();
            (self.generation)()
        }
    }

    fn source(title: &str, src: &str) -> KnowledgeItem {
        KnowledgeItem {
            id: title.to_string(),
            title: title.to_string(),
            content: format!("{title} content"),
            source: src.to_string(),
            last_updated: Utc::now(),
            url: None,
        }
    }

    fn remote_only(edge: Scripted) -> GuataService {
        GuataService::new(Arc::new(edge), None, ComposerConfig::default())
    }

    fn no_rag() -> Result<WebContext> {
        Ok(WebContext::default())
    }

    fn rag_with_answer() -> Result<WebContext> {
        Ok(WebContext {
            sources: vec![source("Bioparque", "bioparque.com.br")],
            answer: Some("O Bioparque abre às 8h30.".into()),
            confidence: Some(0.9),
        })
    }

    fn rag_sources_only() -> Result<WebContext> {
        Ok(WebContext {
            sources: vec![source("Gruta do Lago Azul", "bonito.ms.gov.br")],
            answer: None,
            confidence: Some(0.8),
        })
    }

    fn rag_low_confidence() -> Result<WebContext> {
        Ok(WebContext {
            sources: vec![],
            answer: None,
            confidence: Some(0.2),
        })
    }

    fn rag_broken() -> Result<WebContext> {
        Err(GuataError::Status {
            endpoint: "guata-web-rag".into(),
            status: 500,
            message: "boom".into(),
        })
    }

    fn generated() -> Result<String> {
        Ok("Resposta gerada.".into())
    }

    fn blank() -> Result<String> {
        Ok("   ".into())
    }

    fn unavailable() -> Result<String> {
        Err(GuataError::Unavailable("offline".into()))
    }

    // -- tiers ---

    #[tokio::test]
    async fn generation_wins() {
        let service = remote_only(Scripted::new(rag_with_answer, generated));
        let out = service.ask(&AskRequest::new("horário do bioparque")).await;
        assert_eq!(out, "Resposta gerada.");
    }

    #[tokio::test]
    async fn knowledge_base_includes_rag_answer_last() {
        let edge = Arc::new(Scripted::new(rag_with_answer, generated));
        let service = GuataService::new(edge.clone(), None, ComposerConfig::default());
        let request = AskRequest::new("horário do bioparque")
            .with_knowledge_base(vec![source("Local", "kb")]);
        service.ask(&request).await;
        assert_eq!(
            *edge.seen_kb.lock().unwrap(),
            vec!["Local".to_string(), "Bioparque".into(), RAG_ANSWER_ID.into()]
        );
    }

    #[tokio::test]
    async fn generation_sees_rewritten_prompt() {
        let edge = Arc::new(Scripted::new(no_rag, generated));
        let service = GuataService::new(edge.clone(), None, ComposerConfig::default());
        let request = AskRequest::new("e lá?").with_history(vec!["Bonito".into()]);
        service.ask(&request).await;
        assert_eq!(
            *edge.seen_prompt.lock().unwrap(),
            "e lá? (contexto anterior: Bonito)"
        );
    }

    #[tokio::test]
    async fn blank_generation_falls_to_direct_answer() {
        let service = remote_only(Scripted::new(rag_with_answer, blank));
        let out = service.ask(&AskRequest::new("horário do bioparque")).await;
        assert_eq!(out, format!("O Bioparque abre às 8h30.{FOLLOW_UP_SUFFIX}"));
    }

    #[tokio::test]
    async fn sources_without_answer_are_summarized() {
        let service = remote_only(Scripted::new(rag_sources_only, unavailable));
        let out = service.ask(&AskRequest::new("gruta em Bonito")).await;
        assert!(out.starts_with(
            "Encontrei algumas referências úteis:\n- Gruta do Lago Azul (bonito.ms.gov.br)"
        ));
        assert!(out.ends_with("como chegar em Bonito?"), "{out}");
    }

    #[tokio::test]
    async fn low_confidence_asks_to_clarify() {
        let service = remote_only(Scripted::new(rag_low_confidence, unavailable));
        let out = service.ask(&AskRequest::new("me ajuda")).await;
        assert!(out.starts_with("Para eu te ajudar melhor"), "{out}");
    }

    #[tokio::test]
    async fn everything_down_still_answers_with_narrative() {
        let service = remote_only(Scripted::new(rag_broken, unavailable));
        let out = service.ask(&AskRequest::new("oi")).await;
        assert!(GREETINGS.contains(&out.as_str()));
        assert_eq!(service.metrics().remote_failures(), 1);
    }

    // -- local search ---

    #[tokio::test]
    async fn offline_greeting_with_local_search() {
        let search = Arc::new(DynamicWebSearch::from_config(&GuataConfig::default()).unwrap());
        let service =
            GuataService::new(Arc::new(OfflineEdge), Some(search), ComposerConfig::default());
        let out = service.ask(&AskRequest::new("oi")).await;
        assert!(GREETINGS.contains(&out.as_str()), "{out}");
        assert_eq!(service.metrics().remote_failures(), 0);
    }

    #[tokio::test]
    async fn offline_question_is_never_blank() {
        let service = GuataService::from_config(&GuataConfig::default()).unwrap();
        for prompt in ["horário do bioparque", "hotel barato", "", "Rota Bioceânica"] {
            let out = service.ask(&AskRequest::new(prompt)).await;
            assert!(!out.trim().is_empty(), "{prompt}");
        }
        assert!(service.search_engine().is_some());
    }

    #[tokio::test]
    async fn web_context_disabled_skips_everything_but_generation() {
        let config = ComposerConfig {
            fetch_web_context: false,
            ..ComposerConfig::default()
        };
        let service = GuataService::new(
            Arc::new(Scripted::new(rag_with_answer, blank)),
            None,
            config,
        );
        let out = service.ask(&AskRequest::new("Pantanal")).await;
        assert!(!out.contains("8h30"));
    }

    // -- merging ---

    #[test]
    fn merge_dedupes_by_title_and_source() {
        let remote = WebContext {
            sources: vec![source("A", "x"), source("B", "y")],
            answer: Some("  ".into()),
            confidence: Some(0.5),
        };
        let local = WebContext {
            sources: vec![source("A", "x"), source("A", "z")],
            answer: Some("local".into()),
            confidence: None,
        };
        let merged = merge_contexts(remote, local);
        let keys: Vec<(&str, &str)> = merged
            .sources
            .iter()
            .map(|s| (s.title.as_str(), s.source.as_str()))
            .collect();
        assert_eq!(keys, vec![("A", "x"), ("B", "y"), ("A", "z")]);
        assert_eq!(merged.answer.as_deref(), Some("local"));
        assert_eq!(merged.confidence, Some(0.5));
    }

    #[test]
    fn knowledge_base_without_answer_has_no_rag_doc() {
        let ctx = WebContext {
            sources: vec![source("A", "x")],
            answer: None,
            confidence: None,
        };
        let kb = merge_knowledge_base(&[], &ctx);
        assert_eq!(kb.len(), 1);
        assert!(kb.iter().all(|k| k.id != RAG_ANSWER_ID));
    }
}
