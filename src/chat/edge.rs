//! Clients for the hosted edge functions.
//!
//! `guata-web-rag` returns web sources plus an optional consolidated answer;
//! `guata-ai` generates the final reply from a knowledge base. Both live at
//! `{base_url}/functions/v1/{name}`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::schema::EdgeConfig;
use crate::error::{GuataError, Result};
use crate::observability::redact_secrets;
use crate::search::registry::host_of;
use crate::types::{ChatMode, KnowledgeItem};

const DEFAULT_WEB_TITLE: &str = "Informação da Web";

// ---------------------------------------------------------------------------
// Web RAG
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct WebRagRequest<'a> {
    pub question: &'a str,
    pub state_code: &'a str,
    pub max_results: usize,
    pub include_sources: bool,
}

/// Sources, consolidated answer and confidence (0–1) from the web RAG
/// function. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebContext {
    pub sources: Vec<KnowledgeItem>,
    pub answer: Option<String>,
    pub confidence: Option<f64>,
}

impl WebContext {
    /// Lenient decode: unknown shapes become an empty context.
    pub fn from_value(data: &Value, now: DateTime<Utc>) -> Self {
        let sources = data
            .get("sources")
            .and_then(Value::as_array)
            .map(|raw| {
                raw.iter()
                    .enumerate()
                    .map(|(i, s)| web_source(i, s, now))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            sources,
            answer: text_field(data, "answer"),
            confidence: data.get("confidence").and_then(Value::as_f64),
        }
    }

    /// Non-blank consolidated answer.
    pub fn direct_answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|a| !a.trim().is_empty())
    }
}

fn text_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn web_source(index: usize, s: &Value, now: DateTime<Utc>) -> KnowledgeItem {
    let title = text_field(s, "title");
    let link = text_field(s, "link");
    let chunk_id = match s.get("chunk_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    KnowledgeItem {
        id: chunk_id
            .or_else(|| title.clone())
            .unwrap_or_else(|| format!("web-{index}")),
        title: title.unwrap_or_else(|| DEFAULT_WEB_TITLE.to_string()),
        content: text_field(s, "snippet")
            .or_else(|| text_field(s, "content"))
            .or_else(|| text_field(s, "text"))
            .unwrap_or_default(),
        source: text_field(s, "source")
            .or_else(|| link.as_deref().map(host_of).filter(|h| !h.is_empty()))
            .unwrap_or_else(|| "web".to_string()),
        last_updated: now,
        url: link,
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Knowledge base entry as the generation function expects it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub source: &'a str,
    pub last_updated: DateTime<Utc>,
}

impl<'a> From<&'a KnowledgeItem> for WireDocument<'a> {
    fn from(item: &'a KnowledgeItem) -> Self {
        Self {
            id: &item.id,
            title: &item.title,
            content: &item.content,
            source: if item.source.is_empty() {
                "web"
            } else {
                item.source.as_str()
            },
            last_updated: item.last_updated,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub knowledge_base: Vec<WireDocument<'a>>,
    /// JSON-encoded user info, or empty.
    pub user_context: String,
    /// History turns joined by newlines.
    pub chat_history: String,
    pub mode: ChatMode,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(
        prompt: &'a str,
        knowledge_base: &'a [KnowledgeItem],
        user_info: Option<&Value>,
        history: &[String],
        mode: ChatMode,
    ) -> Self {
        Self {
            prompt,
            knowledge_base: knowledge_base.iter().map(WireDocument::from).collect(),
            user_context: user_info.map(Value::to_string).unwrap_or_default(),
            chat_history: history.join("\n"),
            mode,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    response: Option<String>,
}

// ---------------------------------------------------------------------------
// EdgeFunctions trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait EdgeFunctions: Send + Sync {
    async fn web_rag(&self, question: &str) -> Result<WebContext>;

    /// Generated reply text; may be empty.
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;
}

/// Stand-in when no edge base URL is configured.
pub struct OfflineEdge;

#[async_trait]
impl EdgeFunctions for OfflineEdge {
    async fn web_rag(&self, _question: &str) -> Result<WebContext> {
        Err(GuataError::Unavailable("edge functions not configured".into()))
    }

    async fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String> {
        Err(GuataError::Unavailable("edge functions not configured".into()))
    }
}

pub fn edge_from_config(config: &EdgeConfig) -> Result<Arc<dyn EdgeFunctions>> {
    if config.is_configured() {
        Ok(Arc::new(SupabaseEdgeClient::new(config)?))
    } else {
        tracing::debug!("edge base url not configured, running offline");
        Ok(Arc::new(OfflineEdge))
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

pub struct SupabaseEdgeClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: Option<String>,
    generation_function: String,
    web_rag_function: String,
    state_code: String,
    max_results: usize,
}

impl SupabaseEdgeClient {
    pub fn new(config: &EdgeConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .ok_or_else(|| GuataError::Config("edge.base_url is not set".into()))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("guata/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            anon_key: config.anon_key.clone().filter(|k| !k.trim().is_empty()),
            generation_function: config.generation_function.clone(),
            web_rag_function: config.web_rag_function.clone(),
            state_code: config.state_code.clone(),
            max_results: config.max_results,
        })
    }

    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{name}", self.base_url)
    }

    async fn invoke<B: Serialize + ?Sized>(&self, name: &str, body: &B) -> Result<Value> {
        let mut req = self.client.post(self.function_url(name)).json(body);
        if let Some(key) = &self.anon_key {
            req = req.bearer_auth(key).header("apikey", key);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(GuataError::Status {
                endpoint: name.to_string(),
                status: status.as_u16(),
                message: redact_secrets(&text),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl EdgeFunctions for SupabaseEdgeClient {
    async fn web_rag(&self, question: &str) -> Result<WebContext> {
        let body = WebRagRequest {
            question,
            state_code: &self.state_code,
            max_results: self.max_results,
            include_sources: true,
        };
        let data = self.invoke(&self.web_rag_function, &body).await?;
        let context = WebContext::from_value(&data, Utc::now());
        tracing::debug!(sources = context.sources.len(), "web context fetched");
        Ok(context)
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        let data = self.invoke(&self.generation_function, request).await?;
        let parsed: GenerationResponse = serde_json::from_value(data)?;
        Ok(parsed.response.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
