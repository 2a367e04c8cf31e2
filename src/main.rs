//! # Diário Oficial CLI (`dio`)
//!
//! Lists, reads and searches the official gazettes of Campo Grande/MS from
//! the terminal, and starts the tool server for LLM clients.
//!
//! ## Usage
//!
//! ```bash
//! dio --config ./config/dio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dio list` | List gazettes (most recent by default) |
//! | `dio read <numero>` | Read the text of one gazette |
//! | `dio search "<termo>"` | Search one gazette or the whole archive |
//! | `dio tool list` | Show registered tools and their schemas |
//! | `dio tool call <name>` | Call a tool with `--param key=value` pairs |
//! | `dio decode <url>` | Show the payload inside a download URL |
//! | `dio serve mcp` | Start the HTTP / MCP tool server |
//!
//! ## Examples
//!
//! ```bash
//! dio list --palavra licitação
//! dio read "mais recente"
//! dio search "edital" --numero 8096
//! dio tool call buscarPublicacao --param termo=nomeação
//! dio serve mcp --config ./config/dio.toml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use diogrande_harness::config::{self, Config};
use diogrande_harness::directory::{decode_download_payload, GazetteDirectory};
use diogrande_harness::models::GazetteFilter;
use diogrande_harness::server;
use diogrande_harness::tools::{GazetteTools, SearchRequest, ToolOutput};
use diogrande_harness::traits::{ToolContext, ToolRegistry};

/// Diário Oficial CLI: access the DIOGRANDE gazette archive.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist the built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "dio",
    about = "Access the official gazettes (DIOGRANDE) of Campo Grande/MS",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/dio.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List gazettes from the upstream directory.
    ///
    /// With no filters the upstream returns its most recent editions.
    List {
        /// Gazette number.
        #[arg(long)]
        numero: Option<String>,
        /// Keyword filter applied by the upstream.
        #[arg(long)]
        palavra: Option<String>,
        /// Start date, as the portal accepts it.
        #[arg(long)]
        de: Option<String>,
        /// End date.
        #[arg(long)]
        ate: Option<String>,
    },

    /// Read the text of one gazette (`"mais recente"` for the newest).
    Read {
        numero: String,
        /// OFICIAL, SUPLEMENTO I, SUPLEMENTO II, EXTRA.
        #[arg(long)]
        tipo: Option<String>,
    },

    /// Search for a term in one gazette or across the archive.
    Search {
        termo: String,
        /// Restrict the search to this gazette number.
        #[arg(long)]
        numero: Option<String>,
        #[arg(long)]
        tipo: Option<String>,
    },

    /// Inspect and call the registered tools.
    Tool {
        #[command(subcommand)]
        action: ToolAction,
    },

    /// Print the JSON payload encoded in a gazette download URL.
    Decode { url: String },

    /// Start a server.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

#[derive(Subcommand)]
enum ToolAction {
    /// List all registered tools.
    List,
    /// Call a tool with `key=value` parameters and print its envelope.
    Call {
        name: String,
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum ServeService {
    /// Start the HTTP tool server with the MCP endpoint at `/mcp`.
    ///
    /// Binds to the address configured in `[server].bind`.
    Mcp,
}

/// Parse a `key=value` pair for `--param` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// A missing file means defaults; a present but invalid one is an error.
fn resolve_config(path: &std::path::Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

fn print_envelope(output: &ToolOutput) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Commands that don't require config
    if let Commands::Decode { url } = &cli.command {
        let payload = decode_download_payload(url)?;
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let cfg = resolve_config(&cli.config)?;

    match cli.command {
        Commands::List {
            numero,
            palavra,
            de,
            ate,
        } => {
            let directory = GazetteDirectory::from_config(&cfg.upstream)?;
            let filter = GazetteFilter {
                numero,
                palavra,
                de,
                ate,
            };
            let gazettes = directory
                .list(&filter)
                .await
                .context("failed to list gazettes")?;
            if gazettes.is_empty() {
                println!("No gazettes found.");
            }
            for g in &gazettes {
                println!("📄 {}", g.headline());
                println!("   {}", g.download_url());
            }
        }
        Commands::Read { numero, tipo } => {
            let tools = GazetteTools::from_config(&cfg)?;
            print_envelope(&tools.read_gazette(&numero, tipo.as_deref()).await)?;
        }
        Commands::Search {
            termo,
            numero,
            tipo,
        } => {
            let tools = GazetteTools::from_config(&cfg)?;
            let request = SearchRequest {
                numero,
                tipo,
                ..SearchRequest::new(termo)
            };
            print_envelope(&tools.search_publication(&request).await)?;
        }
        Commands::Tool { action } => match action {
            ToolAction::List => {
                let registry = ToolRegistry::with_builtins();
                for info in registry.infos() {
                    let tag = if info.builtin { "builtin" } else { "rust" };
                    println!("{} ({})", info.name, tag);
                    println!("  {}", info.description);
                    println!("  {}", serde_json::to_string(&info.parameters)?);
                }
            }
            ToolAction::Call { name, params } => {
                let registry = ToolRegistry::with_builtins();
                let ctx = ToolContext::new(Arc::new(GazetteTools::from_config(&cfg)?));
                let params: serde_json::Map<String, serde_json::Value> = params
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                let result = registry
                    .call(&name, &serde_json::Value::Object(params), &ctx)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        },
        Commands::Serve { service } => match service {
            ServeService::Mcp => {
                server::run_server(&cfg).await?;
            }
        },
        Commands::Decode { .. } => unreachable!(),
    }

    Ok(())
}
