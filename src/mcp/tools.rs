/// MCP Tool handlers for ragindex.
///
/// 1. search          – top-K similarity search over the corpus
/// 2. rebuild_index   – build or reuse the cached index
/// 3. list_documents  – list the loaded corpus
/// 4. get_policy      – return the retrieval policy text
use crate::mcp::server::McpContext;
use crate::models::Document;
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{ErrorData as McpError, handler::server::tool::ToolRouter, model::*, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

// ── Parameter structs ────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct SearchParams {
    /// Search query (natural language)
    query: String,
    /// Max results (default from config; negative values return nothing)
    top_k: Option<i64>,
}

// ── Response helpers ─────────────────────────────────────────────────

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&value).unwrap_or_default(),
    )]))
}

fn error_result(msg: &str) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.to_string())]))
}

/// Requested result count, clamped at zero.
fn resolve_top_k(requested: Option<i64>, default: usize) -> usize {
    match requested {
        Some(n) => usize::try_from(n).unwrap_or(0),
        None => default,
    }
}

fn document_summary(doc: &Document) -> serde_json::Value {
    serde_json::json!({
        "id": doc.id,
        "title": doc.title,
        "file": doc.source_file,
        "source_url": doc.source_url,
        "tags": doc.tags,
    })
}

// ── Tool implementations ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppTools {
    pub ctx: McpContext,
    pub tool_router: ToolRouter<Self>,
}

impl ServerHandler for AppTools {}

#[tool_router]
impl AppTools {
    pub fn new(ctx: McpContext) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Return the documents most similar to a natural language query, best first, with cosine similarity scores."
    )]
    async fn search(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.query.trim().is_empty() {
            return error_result("query is required");
        }

        let top_k = resolve_top_k(p.top_k, self.ctx.config.search_top_k);
        let results = self
            .ctx
            .retriever
            .search(&p.query, top_k)
            .await
            .map_err(|e| McpError::internal_error(format!("search failed: {e}"), None))?;

        json_result(serde_json::json!({ "results": results }))
    }

    #[tool(
        description = "Build the vector index for the current corpus, reusing the cache when nothing changed"
    )]
    async fn rebuild_index(&self) -> Result<CallToolResult, McpError> {
        let stats = self
            .ctx
            .retriever
            .rebuild()
            .await
            .map_err(|e| McpError::internal_error(format!("rebuild failed: {e}"), None))?;

        json_result(serde_json::json!({
            "documents": stats.documents,
            "cache_hit": stats.cache_hit,
            "batches": stats.batches,
            "dimensions": stats.dimensions,
            "embedding_model": self.ctx.retriever.model(),
        }))
    }

    #[tool(description = "List the documents in the corpus")]
    async fn list_documents(&self) -> Result<CallToolResult, McpError> {
        let docs = self
            .ctx
            .retriever
            .documents()
            .map_err(|e| McpError::internal_error(format!("list failed: {e}"), None))?;

        let documents: Vec<serde_json::Value> = docs.iter().map(document_summary).collect();
        json_result(serde_json::json!({
            "count": documents.len(),
            "documents": documents,
        }))
    }

    #[tool(description = "Return the retrieval policy document verbatim")]
    async fn get_policy(&self) -> Result<CallToolResult, McpError> {
        match self.ctx.retriever.policy() {
            Ok(policy) => Ok(CallToolResult::success(vec![Content::text(policy)])),
            Err(e) => error_result(&e.to_string()),
        }
    }
}
