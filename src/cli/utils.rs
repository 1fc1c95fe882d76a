//! CLI utility functions
//!
//! Client construction and output helpers shared by the client commands.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use super::ClientArgs;
use crate::config::ClientConfig;
use crate::remote::RpcClient;

/// Build a client from the global flags, falling back to `~/.smf/client.toml`
pub fn connect(args: &ClientArgs) -> Result<RpcClient> {
    let mut config = ClientConfig::load().context("Failed to load client config")?;
    if let Some(url) = &args.server {
        config.server.url = url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.server.timeout_secs = timeout;
    }

    RpcClient::from_config(&config)
        .with_context(|| format!("Cannot create client for {}", config.server.url))
}

/// Pretty-print any serializable value as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success line: `✓ <message>`
pub fn success(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green(), message);
}

/// Print a section header with an underline
pub fn header(title: &str, width: usize) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(width));
}
