//! Tool trait, registry and the built-in gazette tools.
//!
//! The HTTP server, the MCP bridge and the `dio tool` CLI all dispatch
//! through a [`ToolRegistry`]. Each [`Tool`] publishes an OpenAI
//! function-calling schema and receives validated JSON parameters.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                ToolRegistry                  │
//! │  listarDiariosRecentes  lerDiarioOficial     │
//! │  buscarPublicacao       (custom Rust tools)  │
//! └──────────────┬───────────────────────────────┘
//!                ▼
//!     ToolContext → GazetteTools → GazetteDirectory
//! ```
//!
//! # Usage
//!
//! ```rust
//! use diogrande_harness::traits::ToolRegistry;
//!
//! let tools = ToolRegistry::with_builtins();
//! assert!(tools.find("buscarPublicacao").is_some());
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::tools::{GazetteTools, SearchRequest};

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A callable tool exposed to the LLM loop.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use diogrande_harness::traits::{Tool, ToolContext};
///
/// pub struct CountRecentTool;
///
/// #[async_trait]
/// impl Tool for CountRecentTool {
///     fn name(&self) -> &str { "contarDiariosRecentes" }
///     fn description(&self) -> &str { "Conta os diários oficiais recentes" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         let out = ctx.gazettes().list_recent().await.to_value();
///         Ok(json!({ "quantidade": out["quantidade"] }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name used in `POST /tools/{name}` and in MCP `call_tool`.
    fn name(&self) -> &str;

    /// One-line description the model reads to decide whether to call it.
    fn description(&self) -> &str;

    /// Whether this is one of the built-in gazette tools.
    fn is_builtin(&self) -> bool {
        false
    }

    /// OpenAI function-calling JSON Schema (`type: "object"`).
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `params` has already passed [`validate_params`].
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Shared state handed to every tool invocation.
#[derive(Clone)]
pub struct ToolContext {
    gazettes: Arc<GazetteTools>,
}

impl ToolContext {
    pub fn new(gazettes: Arc<GazetteTools>) -> Self {
        Self { gazettes }
    }

    pub fn gazettes(&self) -> &GazetteTools {
        &self.gazettes
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

/// `listarDiariosRecentes` → [`GazetteTools::list_recent`].
pub struct ListRecentTool;

#[async_trait]
impl Tool for ListRecentTool {
    fn name(&self) -> &str {
        "listarDiariosRecentes"
    }

    fn description(&self) -> &str {
        "Lista os diários oficiais mais recentes de Campo Grande/MS, incluindo número, tipo, data e link de download."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(ctx.gazettes().list_recent().await.to_value())
    }
}

/// `lerDiarioOficial` → [`GazetteTools::read_gazette`].
pub struct ReadGazetteTool;

#[async_trait]
impl Tool for ReadGazetteTool {
    fn name(&self) -> &str {
        "lerDiarioOficial"
    }

    fn description(&self) -> &str {
        "Lê o conteúdo completo de um diário oficial específico de Campo Grande/MS. Informe o número do diário (ex: \"8096\") ou use \"mais recente\" para o diário mais atual."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "numero": {
                    "type": "string",
                    "description": "Número do diário oficial (ex: \"8096\") ou \"mais recente\" para buscar o diário mais atual"
                },
                "tipo": {
                    "type": "string",
                    "description": "Tipo do diário: OFICIAL, SUPLEMENTO I, SUPLEMENTO II, EXTRA (padrão: OFICIAL)"
                }
            },
            "required": ["numero"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let numero = params["numero"].as_str().unwrap_or("");
        let tipo = params["tipo"].as_str();
        Ok(ctx.gazettes().read_gazette(numero, tipo).await.to_value())
    }
}

/// `buscarPublicacao` → [`GazetteTools::search_publication`].
pub struct SearchPublicationTool;

#[async_trait]
impl Tool for SearchPublicationTool {
    fn name(&self) -> &str {
        "buscarPublicacao"
    }

    fn description(&self) -> &str {
        "Busca por palavras-chave ou termos específicos nos diários oficiais de Campo Grande/MS. Se não especificar número do diário, faz busca global em todos os diários disponíveis."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "termo": {
                    "type": "string",
                    "description": "Termo ou palavra-chave para buscar nas publicações (ex: \"licitação\", \"edital\", nome de empresa)"
                },
                "numeroDiario": {
                    "type": "string",
                    "description": "Número específico do diário para buscar (opcional, se omitido busca em todos os diários)"
                },
                "tipo": {
                    "type": "string",
                    "description": "Tipo do diário quando numeroDiario é informado: OFICIAL, SUPLEMENTO I, SUPLEMENTO II, EXTRA"
                },
                "de": {
                    "type": "string",
                    "description": "Data inicial da busca global (como aceita pelo portal, ex: 01/01/2025)"
                },
                "ate": {
                    "type": "string",
                    "description": "Data final da busca global"
                }
            },
            "required": ["termo"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let text = |key: &str| params[key].as_str().map(str::to_string);
        let request = SearchRequest {
            termo: text("termo").unwrap_or_default(),
            numero: text("numeroDiario"),
            tipo: text("tipo"),
            de: text("de"),
            ate: text("ate"),
        };
        Ok(ctx.gazettes().search_publication(&request).await.to_value())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter validation
// ═══════════════════════════════════════════════════════════════════════

/// Serializable tool info for `GET /tools/list` and `dio tool list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    /// OpenAI function-calling JSON Schema.
    pub parameters: Value,
}

impl ToolInfo {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            builtin: tool.is_builtin(),
            parameters: tool.parameters_schema(),
        }
    }
}

/// Check `params` against a tool schema.
///
/// Required keys must be present and non-null; present keys must match the
/// declared `type` and `enum`; `null` optional keys are dropped; absent keys
/// with a `default` get it injected.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let params_obj = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => bail!("parameters must be a JSON object, got {}", json_type_name(other)),
    };

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<String> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let mut result = params_obj.clone();

    for req_field in &required {
        match params_obj.get(req_field) {
            None | Some(Value::Null) => bail!("missing required parameter: {}", req_field),
            Some(_) => {}
        }
    }

    for (prop_name, prop_schema) in &properties {
        match params_obj.get(prop_name) {
            Some(Value::Null) => {
                result.remove(prop_name);
            }
            Some(value) => {
                if let Some(expected_type) = prop_schema.get("type").and_then(|t| t.as_str()) {
                    let type_ok = match expected_type {
                        "string" => value.is_string(),
                        "integer" => value.is_i64() || value.is_u64(),
                        "number" => value.is_number(),
                        "boolean" => value.is_boolean(),
                        "array" => value.is_array(),
                        "object" => value.is_object(),
                        _ => true,
                    };
                    if !type_ok {
                        bail!(
                            "parameter '{}' must be of type '{}', got {}",
                            prop_name,
                            expected_type,
                            json_type_name(value)
                        );
                    }
                }

                if let Some(enum_values) = prop_schema.get("enum").and_then(|e| e.as_array()) {
                    if !enum_values.contains(value) {
                        let allowed: Vec<String> =
                            enum_values.iter().map(|v| v.to_string()).collect();
                        bail!(
                            "parameter '{}' must be one of [{}], got {}",
                            prop_name,
                            allowed.join(", "),
                            value
                        );
                    }
                }
            }
            None => {
                if let Some(default) = prop_schema.get("default") {
                    result.insert(prop_name.clone(), default.clone());
                }
            }
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry for tools (built-in and custom Rust).
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry pre-loaded with the three gazette tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ListRecentTool));
        registry.register(Box::new(ReadGazetteTool));
        registry.register(Box::new(SearchPublicationTool));
        registry
    }

    /// Register a tool. A later tool with the same name shadows nothing;
    /// [`find`](ToolRegistry::find) returns the first match.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn infos(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo::from_tool(t.as_ref()))
            .collect()
    }

    /// Validate and execute a tool by name.
    pub async fn call(&self, name: &str, params: &Value, ctx: &ToolContext) -> Result<Value> {
        let tool = self
            .find(name)
            .ok_or_else(|| anyhow::anyhow!("no tool registered with name: {}", name))?;
        let validated = validate_params(&tool.parameters_schema(), params)
            .map_err(|e| anyhow::anyhow!("invalid parameters: {}", e))?;
        tool.execute(validated, ctx).await
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered_in_order() {
        let registry = ToolRegistry::with_builtins();
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec!["listarDiariosRecentes", "lerDiarioOficial", "buscarPublicacao"]
        );
        assert!(registry.tools().iter().all(|t| t.is_builtin()));
    }

    #[test]
    fn missing_required_parameter() {
        let schema = ReadGazetteTool.parameters_schema();
        let err = validate_params(&schema, &json!({})).unwrap_err();
        assert!(err.to_string().contains("numero"));
    }

    #[test]
    fn null_required_parameter_is_missing() {
        let schema = SearchPublicationTool.parameters_schema();
        assert!(validate_params(&schema, &json!({ "termo": null })).is_err());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let schema = ReadGazetteTool.parameters_schema();
        let err = validate_params(&schema, &json!({ "numero": 8096 })).unwrap_err();
        assert!(err.to_string().contains("must be of type 'string'"));
    }

    #[test]
    fn null_optional_parameter_is_dropped() {
        let schema = SearchPublicationTool.parameters_schema();
        let v = validate_params(&schema, &json!({ "termo": "edital", "numeroDiario": null }))
            .unwrap();
        assert!(v.get("numeroDiario").is_none());
        assert_eq!(v["termo"], "edital");
    }

    #[test]
    fn enum_and_default_handling() {
        let schema = json!({
            "type": "object",
            "properties": {
                "modo": { "type": "string", "enum": ["a", "b"], "default": "a" }
            }
        });
        assert_eq!(validate_params(&schema, &json!({})).unwrap()["modo"], "a");
        assert!(validate_params(&schema, &json!({ "modo": "c" })).is_err());
    }

    #[test]
    fn non_object_params_rejected() {
        let schema = ListRecentTool.parameters_schema();
        assert!(validate_params(&schema, &json!([1, 2])).is_err());
        assert!(validate_params(&schema, &Value::Null).is_ok());
    }
}
