//! MCP server implementation using rmcp over stdio transport.
//!
//! Exposes the answer composer and the dynamic search engine as four tools
//! and two read-only resources.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    Annotated, CallToolRequestParams, CallToolResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParams, RawResource, ReadResourceRequestParams, ReadResourceResult,
    ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{tool, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use serde::{Deserialize, Serialize};

use crate::chat::edge::edge_from_config;
use crate::chat::GuataService;
use crate::config::schema::GuataConfig;
use crate::error::Result;
use crate::search::DynamicWebSearch;
use crate::types::{AskRequest, ChatMode};

pub const SOURCES_URI: &str = "guata://sources";
pub const STATS_URI: &str = "guata://stats";

// ---------------------------------------------------------------------------
// Server struct
// ---------------------------------------------------------------------------

/// Guatá MCP server. Cheap to clone; every clone shares the same cache.
#[derive(Clone)]
pub struct GuataServer {
    service: Arc<GuataService>,
    search: Arc<DynamicWebSearch>,
}

impl std::fmt::Debug for GuataServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuataServer")
            .field("searchers", &self.search.searcher_names())
            .finish()
    }
}

impl GuataServer {
    pub fn new(service: Arc<GuataService>, search: Arc<DynamicWebSearch>) -> Self {
        Self { service, search }
    }

    /// One search engine shared by the composer (when local search is on)
    /// and the search tools.
    pub fn from_config(config: &GuataConfig) -> Result<Self> {
        let search = Arc::new(DynamicWebSearch::from_config(config)?);
        let local = config
            .composer
            .use_local_search
            .then(|| Arc::clone(&search));
        let service = GuataService::new(
            edge_from_config(&config.edge)?,
            local,
            config.composer.clone(),
        );
        Ok(Self::new(Arc::new(service), search))
    }

    pub fn service(&self) -> &Arc<GuataService> {
        &self.service
    }

    pub fn search_engine(&self) -> &Arc<DynamicWebSearch> {
        &self.search
    }

    /// JSON body of a resource, or `None` for an unknown URI.
    pub fn resource_json(&self, uri: &str) -> Option<serde_json::Value> {
        match uri {
            SOURCES_URI => {
                let sources: Vec<serde_json::Value> = self
                    .search
                    .registry()
                    .sorted()
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "name": s.name,
                            "domain": s.domain,
                            "priority": s.priority,
                            "category": s.category,
                        })
                    })
                    .collect();
                Some(serde_json::json!({ "count": sources.len(), "sources": sources }))
            }
            STATS_URI => serde_json::to_value(self.search.stats()).ok(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Helper: serialize to JSON text
// ---------------------------------------------------------------------------

pub(crate) fn json_text<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}

// ---------------------------------------------------------------------------
// Tool parameter structs
// ---------------------------------------------------------------------------

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct AskParams {
    #[schemars(description = "The tourist's question, in Portuguese or English")]
    pub prompt: String,
    #[schemars(description = "Earlier user turns, oldest first")]
    pub history: Option<Vec<String>>,
    #[schemars(description = "Persona: 'tourist' (default) or 'cat' (assistance center)")]
    pub mode: Option<String>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct SearchParams {
    #[schemars(description = "Search query about Mato Grosso do Sul tourism")]
    pub query: String,
    #[schemars(description = "Maximum candidates to include (default 10)")]
    pub limit: Option<usize>,
}

const DEFAULT_SEARCH_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Tool implementations
// ---------------------------------------------------------------------------

#[tool_router]
impl GuataServer {
    #[tool(
        name = "guata_ask",
        description = "Ask Guatá, the Mato Grosso do Sul tourism guide. Combines web RAG, local trusted sources and generation, falling back to curated replies. Always returns text."
    )]
    async fn guata_ask(&self, Parameters(p): Parameters<AskParams>) -> String {
        let mode = p
            .mode
            .as_deref()
            .and_then(ChatMode::from_str_loose)
            .unwrap_or_default();
        let request = AskRequest::new(p.prompt)
            .with_history(p.history.unwrap_or_default())
            .with_mode(mode);
        self.service.ask(&request).await
    }

    #[tool(
        name = "guata_search",
        description = "Multi-source search over official, tourism, review, news and social sources with cross-source scoring. Returns the best answer, its confidence (0-100), sources and ranked candidates."
    )]
    async fn guata_search(&self, Parameters(p): Parameters<SearchParams>) -> String {
        let analysis = self.search.search(&p.query).await;
        let limit = p.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let mut json = match serde_json::to_value(analysis.as_ref()) {
            Ok(v) => v,
            Err(e) => return serde_json::json!({ "error": e.to_string() }).to_string(),
        };
        if let Some(results) = json.get_mut("results").and_then(|r| r.as_array_mut()) {
            results.truncate(limit);
        }
        json_text(&json)
    }

    #[tool(
        name = "guata_search_stats",
        description = "Search cache size, average cached confidence, configured searchers and hit/miss counters."
    )]
    async fn guata_search_stats(&self) -> String {
        json_text(&self.search.stats())
    }

    #[tool(
        name = "guata_clear_cache",
        description = "Drop every cached search analysis."
    )]
    async fn guata_clear_cache(&self) -> String {
        let before = self.search.stats().cache.cache_size;
        self.search.clear_cache();
        json_text(&serde_json::json!({ "cleared": true, "previousSize": before }))
    }
}

// ---------------------------------------------------------------------------
// ServerHandler
// ---------------------------------------------------------------------------

impl ServerHandler for GuataServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Guatá answers tourism questions about Mato Grosso do Sul, Brazil. \
                 Use guata_ask for conversational answers and guata_search for ranked, \
                 sourced candidates with confidence scores."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: rmcp::model::Implementation {
                name: "guata".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<ListResourcesResult, McpError>> + Send + '_
    {
        let resource = |uri: &str, name: &str, description: &str| {
            Annotated::new(
                RawResource {
                    uri: uri.into(),
                    name: name.into(),
                    title: None,
                    description: Some(description.into()),
                    mime_type: Some("application/json".into()),
                    size: None,
                    icons: None,
                    meta: None,
                },
                None,
            )
        };
        let resources = vec![
            resource(
                SOURCES_URI,
                "Trusted Sources",
                "Trusted source domains with priority and category.",
            ),
            resource(
                STATS_URI,
                "Search Statistics",
                "Cache size, average confidence and pipeline counters.",
            ),
        ];
        std::future::ready(Ok(ListResourcesResult {
            meta: None,
            next_cursor: None,
            resources,
        }))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<ReadResourceResult, McpError>> + Send + '_
    {
        let result = match self.resource_json(&request.uri) {
            Some(json) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(json_text(&json), request.uri.clone())],
            }),
            None => Err(McpError::resource_not_found(
                format!("Unknown resource: {}", request.uri),
                None,
            )),
        };
        std::future::ready(result)
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<ListToolsResult, McpError>> + Send + '_
    {
        std::future::ready(Ok(ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: Self::tool_router().list_all(),
        }))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let tool_context =
            rmcp::handler::server::tool::ToolCallContext::new(self, request, context);
        Self::tool_router().call(tool_context).await
    }
}

// ---------------------------------------------------------------------------
// Server startup
// ---------------------------------------------------------------------------

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn run_server(config: GuataConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let server = GuataServer::from_config(&config)?;
    tracing::info!(?server, "Guatá MCP server starting on stdio");
    let transport = rmcp::transport::io::stdio();
    let running = server.serve(transport).await.inspect_err(|e| {
        tracing::error!("MCP server error: {}", e);
    })?;
    let _ = running.waiting().await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
