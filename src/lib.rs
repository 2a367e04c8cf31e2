//! # Diogrande Harness
//!
//! Tool-calling access to the official gazette (Diário Oficial, DIOGRANDE)
//! archive of Campo Grande/MS.
//!
//! The crate lists gazette editions, downloads and extracts their PDF text,
//! and searches it, exposing everything as three LLM tools that return
//! JSON envelopes (`{ "sucesso": ..., "mensagem": ... }`).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Transport   │──▶│  Directory   │──▶│ Extract+Search │
//! │ reqwest+hdrs │   │ listing/URLs │   │  pdf → lines   │
//! └──────────────┘   └──────┬───────┘   └───────┬───────┘
//!                           └────────┬──────────┘
//!                                    ▼
//!                             ┌─────────────┐
//!                             │ GazetteTools│
//!                             └──────┬──────┘
//!                      ┌─────────────┼─────────────┐
//!                      ▼             ▼             ▼
//!                 ┌────────┐   ┌──────────┐   ┌────────┐
//!                 │  CLI   │   │   HTTP   │   │  MCP   │
//!                 │ (dio)  │   │  /tools  │   │  /mcp  │
//!                 └────────┘   └──────────┘   └────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`transport`] | HTTP client and request identity |
//! | [`models`] | Listing rows and gazette descriptors |
//! | [`directory`] | Listing queries and download URLs |
//! | [`extract`] | PDF text extraction |
//! | [`search`] | Line-based occurrence search |
//! | [`tools`] | The three tool operations |
//! | [`traits`] | `Tool` trait and registry |
//! | [`server`] | HTTP tool server |
//! | [`mcp`] | MCP protocol bridge |

pub mod config;
pub mod directory;
pub mod error;
pub mod extract;
pub mod mcp;
pub mod models;
pub mod search;
pub mod server;
pub mod tools;
pub mod traits;
pub mod transport;

pub use error::{DecodeError, DirectoryError, NetworkError, ToolError};
pub use tools::{GazetteTools, ToolOutput};
