//! HTTP tool server.
//!
//! Exposes the gazette tools through a small JSON HTTP API and an MCP
//! Streamable HTTP endpoint. Every tool is registered in a
//! [`ToolRegistry`] and dispatched through the same `POST /tools/{name}`
//! handler.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call any registered tool by name |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `*`    | `/mcp` | MCP JSON-RPC over Streamable HTTP |
//!
//! # Error Contract
//!
//! Tool outcomes, including upstream failures, are returned as the tool's
//! `{ "sucesso": ..., "mensagem": ... }` envelope under `result` with
//! status 200. Transport-level problems use:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "missing required parameter: termo" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::mcp::McpBridge;
use crate::tools::GazetteTools;
use crate::traits::{validate_params, ToolContext, ToolInfo, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    tools: Arc<ToolRegistry>,
    gazettes: Arc<GazetteTools>,
}

/// Starts the server with the built-in tools on `[server].bind`.
///
/// This is the entry point used by `dio serve mcp`. Runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let gazettes = GazetteTools::from_config(config)?;
    run_server_with_tools(
        &config.server.bind,
        Arc::new(ToolRegistry::with_builtins()),
        Arc::new(gazettes),
    )
    .await
}

/// Starts the server with a caller-supplied registry.
///
/// # Example
///
/// ```rust,no_run
/// use diogrande_harness::server::run_server_with_tools;
/// use diogrande_harness::tools::GazetteTools;
/// use diogrande_harness::traits::ToolRegistry;
/// use std::sync::Arc;
///
/// # async fn example(config: &diogrande_harness::config::Config) -> anyhow::Result<()> {
/// let tools = ToolRegistry::with_builtins();
/// // tools.register(Box::new(MyTool));
/// let gazettes = GazetteTools::from_config(config)?;
/// run_server_with_tools("127.0.0.1:7341", Arc::new(tools), Arc::new(gazettes)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_tools(
    bind_addr: &str,
    tools: Arc<ToolRegistry>,
    gazettes: Arc<GazetteTools>,
) -> anyhow::Result<()> {
    for t in tools.tools() {
        let tag = if t.is_builtin() { "builtin" } else { "rust" };
        tracing::debug!(tool = t.name(), kind = tag, "registered tool");
    }

    let app = router(tools, gazettes);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "tool server listening");
    println!("Tool server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the full router; exposed so it can be served on any listener.
pub fn router(tools: Arc<ToolRegistry>, gazettes: Arc<GazetteTools>) -> Router {
    let bridge = McpBridge::new(tools.clone(), gazettes.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let state = AppState { tools, gazettes };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(state)
}

// ═══════════════════════════════════════════════════════════════════════
// Error response
// ═══════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error".to_string(),
        message: message.into(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Handlers
// ═══════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.tools.infos(),
    })
}

/// Unified tool dispatch: lookup, schema validation, execution.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let validated_params = validate_params(&tool.parameters_schema(), &params)
        .map_err(|e| bad_request(e.to_string()))?;

    tracing::debug!(tool = %name, "tool call");
    let ctx = ToolContext::new(state.gazettes.clone());
    let result = tool
        .execute(validated_params, &ctx)
        .await
        .map_err(|e| tool_error(format!("{}: {}", name, e)))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
