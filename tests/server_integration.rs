//! Integration tests for the HTTP tool server.
//!
//! These tests start the real server on a free port, backed by a mock
//! gazette upstream, and drive it with `reqwest`.

use anyhow::Result;
use async_trait::async_trait;
use axum::{routing::get, Json, Router};
use diogrande_harness::config::Config;
use diogrande_harness::server::run_server_with_tools;
use diogrande_harness::tools::GazetteTools;
use diogrande_harness::traits::{Tool, ToolContext, ToolRegistry};
use serde_json::{json, Value};
use std::sync::Arc;

// ─── Test Tool ──────────────────────────────────────────────────────

/// Counts the recent gazettes through the shared context.
struct CountRecentTool;

#[async_trait]
impl Tool for CountRecentTool {
    fn name(&self) -> &str {
        "contarDiariosRecentes"
    }

    fn description(&self) -> &str {
        "Conta os diários oficiais recentes"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prefixo": { "type": "string" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let out = ctx.gazettes().list_recent().await.to_value();
        Ok(json!({
            "prefixo": params["prefixo"],
            "quantidade": out["quantidade"],
        }))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("server did not start on port {}", port);
}

async fn mock_upstream() -> String {
    let app = Router::new().route(
        "/wp-admin/admin-ajax.php",
        get(|| async {
            Json(json!({
                "data": [
                    { "numero": "8097", "dia": "2025-01-03", "arquivo": "a.pdf", "desctpd": "OFICIAL", "codigodia": 2 },
                    { "numero": "8096", "dia": "2025-01-02", "arquivo": "b.pdf", "desctpd": "OFICIAL", "codigodia": 1 }
                ]
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

/// Starts the tool server with the given registry; returns its port.
async fn start_server(registry: ToolRegistry) -> u16 {
    let mut cfg = Config::minimal();
    cfg.upstream.base_url = mock_upstream().await;
    let gazettes = Arc::new(GazetteTools::from_config(&cfg).unwrap());

    let port = find_free_port();
    let bind = format!("127.0.0.1:{}", port);
    let registry = Arc::new(registry);
    tokio::spawn(async move {
        run_server_with_tools(&bind, registry, gazettes).await.ok();
    });
    wait_for_server(port).await;
    port
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_version() {
    let port = start_server(ToolRegistry::with_builtins()).await;
    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/health", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn tools_list_contains_builtins_and_custom_tool() {
    let mut registry = ToolRegistry::with_builtins();
    registry.register(Box::new(CountRecentTool));
    let port = start_server(registry).await;

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/tools/list", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tools = body["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(
        names,
        vec![
            "listarDiariosRecentes",
            "lerDiarioOficial",
            "buscarPublicacao",
            "contarDiariosRecentes"
        ]
    );
    assert_eq!(tools[0]["builtin"], true);
    assert_eq!(tools[3]["builtin"], false);
    assert_eq!(tools[1]["parameters"]["required"], json!(["numero"]));
    assert_eq!(tools[2]["parameters"]["required"], json!(["termo"]));
}

#[tokio::test]
async fn call_builtin_tool_wraps_envelope_in_result() {
    let port = start_server(ToolRegistry::with_builtins()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!(
            "http://127.0.0.1:{}/tools/listarDiariosRecentes",
            port
        ))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["result"]["sucesso"], true);
    assert_eq!(body["result"]["quantidade"], 2);
    assert_eq!(body["result"]["diarios"][0]["numero"], "8097");
}

#[tokio::test]
async fn call_custom_tool() {
    let mut registry = ToolRegistry::with_builtins();
    registry.register(Box::new(CountRecentTool));
    let port = start_server(registry).await;

    let body: Value = reqwest::Client::new()
        .post(format!(
            "http://127.0.0.1:{}/tools/contarDiariosRecentes",
            port
        ))
        .json(&json!({ "prefixo": "DIOGRANDE" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"]["quantidade"], 2);
    assert_eq!(body["result"]["prefixo"], "DIOGRANDE");
}

#[tokio::test]
async fn unknown_tool_is_404() {
    let port = start_server(ToolRegistry::with_builtins()).await;
    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/tools/naoExiste", port))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn missing_required_parameter_is_400() {
    let port = start_server(ToolRegistry::with_builtins()).await;
    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/tools/buscarPublicacao", port))
        .json(&json!({ "numeroDiario": "8096" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"].as_str().unwrap().contains("termo"));
}

#[tokio::test]
async fn mcp_endpoint_accepts_initialize() {
    let port = start_server(ToolRegistry::with_builtins()).await;
    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/mcp", port))
        .header("accept", "application/json, text/event-stream")
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "test", "version": "0.0.0" }
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let text = resp.text().await.unwrap();
    assert!(text.contains("diogrande-harness"));
}
