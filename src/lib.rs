//! smf - Shared Memory Framework
//!
//! A knowledge server over a markdown vault (an Obsidian-style directory of
//! `.md` notes), exposing one set of methods to AI assistants through several
//! transports.
//!
//! ## Layout
//!
//! - [`core`]: the vault store (path confinement, notes, search, frontmatter)
//! - [`mcp`]: JSON-RPC types, the method registry, tools and the stdio transport
//! - [`http`]: axum router with JSON-RPC, REST, SSE and pseudo-LSP endpoints
//! - [`remote`]: JSON-RPC over HTTP client used by the CLI
//! - [`config`]: server and client configuration

pub mod cli;
pub mod config;
pub mod core;
pub mod http;
pub mod mcp;
pub mod remote;

pub use crate::config::{ServerConfig, SharedConfig};
pub use crate::core::path::NotePath;
pub use crate::core::vault::{Note, Vault, VaultError};
pub use crate::mcp::{run_stdio, Registry, RpcError, ServerState};
pub use crate::remote::{ClientError, RpcClient};
