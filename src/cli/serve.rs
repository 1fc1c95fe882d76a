//! Serve command - Start the knowledge server
//!
//! # Usage
//!
//! ```bash
//! smf serve --vault ~/Obsidian/Vault              # HTTP on 127.0.0.1:5678
//! smf serve --transport stdio                     # Content-Length framing on stdin/stdout
//! SMF_PORT=9000 smf serve --config ./config.json
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use crate::config::{ServerConfig, SharedConfig, DEFAULT_HOST, DEFAULT_PORT};
use crate::http;
use crate::mcp::{run_stdio, Registry, ServerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// HTTP JSON-RPC, REST, SSE and pseudo-LSP endpoints
    Http,
    /// Content-Length framed JSON-RPC on stdin/stdout
    Stdio,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Http => write!(f, "http"),
            Transport::Stdio => write!(f, "stdio"),
        }
    }
}

/// Run the knowledge server
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Transport mode
    #[arg(long, value_enum, default_value_t = Transport::Http)]
    pub transport: Transport,

    /// Vault root (overrides the config file)
    #[arg(long, env = "SMF_VAULT_PATH")]
    pub vault: Option<PathBuf>,

    /// Listen address (http transport)
    #[arg(long, env = "SMF_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Listen port (http transport)
    #[arg(long, env = "SMF_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Server config file (default: ~/.smf/config.json)
    #[arg(long, env = "SMF_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Build the method registry from resolved settings
pub fn build_registry(config: ServerConfig) -> Arc<Registry> {
    Arc::new(Registry::new(ServerState::new(SharedConfig::new(config))))
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::resolve(args.vault, args.config, args.host, args.port);
    let (host, port) = (config.host.clone(), config.port);

    info!(
        transport = %args.transport,
        vault = ?config.vault_path,
        "Starting smf server"
    );

    let registry = build_registry(config);

    match args.transport {
        Transport::Http => {
            let addr = tokio::net::lookup_host((host.as_str(), port))
                .await
                .with_context(|| format!("Cannot resolve {}:{}", host, port))?
                .next()
                .with_context(|| format!("No address for {}:{}", host, port))?;
            http::serve(registry, addr).await
        }
        Transport::Stdio => tokio::task::spawn_blocking(move || run_stdio(registry))
            .await
            .context("stdio server task failed")?,
    }
}
