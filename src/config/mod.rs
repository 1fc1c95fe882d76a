//! Configuration module
//!
//! Two independent files live under `~/.smf/`:
//! - `config.json` - the server's vault location (`{"vault_path": "..."}`)
//! - `client.toml` - where the CLI finds the server
//!
//! The server's settings are resolved once at startup (flags and environment
//! override the file) and then shared through [`SharedConfig`], whose only
//! mutation is [`SharedConfig::set_vault_path`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5678;
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5678";

/// Errors from the narrow runtime config update
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Vault path does not exist or is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to save configuration to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// On-disk server configuration (`config.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultFile {
    #[serde(default)]
    pub vault_path: Option<PathBuf>,
}

impl VaultFile {
    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: VaultFile = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(file)
    }

    /// Save to a file, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Vault root; `None` means "not configured"
    pub vault_path: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    /// Where `POST /config` persists changes
    pub config_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            vault_path: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            config_file: None,
        }
    }
}

impl ServerConfig {
    /// Resolve the configuration with priority:
    /// 1. `vault_override` (flag or `SMF_VAULT_PATH`)
    /// 2. `vault_path` from the config file
    ///
    /// A vault path that is not a directory is reported and dropped, leaving
    /// the server in the "not configured" state instead of failing startup.
    pub fn resolve(
        vault_override: Option<PathBuf>,
        config_file: Option<PathBuf>,
        host: String,
        port: u16,
    ) -> Self {
        let config_file = config_file.or_else(default_config_path);

        let from_file = config_file
            .as_deref()
            .filter(|p| p.exists())
            .and_then(|p| match VaultFile::load_from(p) {
                Ok(file) => file.vault_path,
                Err(e) => {
                    warn!("Ignoring config file: {:#}", e);
                    None
                }
            });

        let vault_path = vault_override.or(from_file).and_then(|path| {
            if path.is_dir() {
                Some(path)
            } else {
                warn!(
                    "Vault path {} is not a directory; server starts unconfigured",
                    path.display()
                );
                None
            }
        });

        if vault_path.is_none() {
            warn!("No vault path configured");
        }

        Self {
            vault_path,
            host,
            port,
            config_file,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.vault_path.is_some()
    }
}

/// Get default server config path (~/.smf/config.json)
pub fn default_config_path() -> Option<PathBuf> {
    smf_home().map(|h| h.join("config.json"))
}

/// Get default client config path (~/.smf/client.toml)
pub fn default_client_config_path() -> Option<PathBuf> {
    smf_home().map(|h| h.join("client.toml"))
}

fn smf_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".smf"))
}

/// Server configuration shared by every transport
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<ServerConfig>>,
}

impl SharedConfig {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Snapshot of the current configuration
    pub fn snapshot(&self) -> ServerConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn vault_path(&self) -> Option<PathBuf> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .vault_path
            .clone()
    }

    pub fn is_configured(&self) -> bool {
        self.vault_path().is_some()
    }

    /// Point the server at a new vault
    ///
    /// The path must be a directory. It is persisted to the config file (when
    /// one is known) before the running configuration changes. Concurrent
    /// updates are last-write-wins.
    pub fn set_vault_path(&self, path: &Path) -> Result<(), ConfigError> {
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory(path.to_path_buf()));
        }

        let config_file = self.snapshot().config_file;
        if let Some(file) = &config_file {
            VaultFile {
                vault_path: Some(path.to_path_buf()),
            }
            .save_to(file)
            .map_err(|source| ConfigError::Save {
                path: file.clone(),
                source,
            })?;
        }

        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .vault_path = Some(path.to_path_buf());

        info!("Vault path set to {}", path.display());
        Ok(())
    }
}

/// CLI client configuration (`client.toml`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ClientServerConfig,
}

/// Where the CLI sends its requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientServerConfig {
    /// Server URL (e.g., "http://localhost:5678")
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl ClientConfig {
    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match default_client_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid client config {}", path.display()))?;
        Ok(config)
    }
}
