//! Server state shared by every transport

use std::time::Instant;

use crate::config::SharedConfig;
use crate::core::vault::Vault;

use super::jsonrpc::RpcError;

/// Runtime data behind the method registry
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Live configuration (vault path can change at runtime)
    pub config: SharedConfig,
    /// When the server was started
    pub started_at: Instant,
}

impl ServerState {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            started_at: Instant::now(),
        }
    }

    /// Open the configured vault
    ///
    /// The path is re-read on every call so a `POST /config` takes effect
    /// for the next request.
    pub fn vault(&self) -> Result<Vault, RpcError> {
        let path = self.config.vault_path().ok_or_else(RpcError::not_configured)?;
        Ok(Vault::open(path)?)
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
