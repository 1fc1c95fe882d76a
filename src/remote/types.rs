//! Result types decoded by the CLI client

use serde::{Deserialize, Serialize};

use crate::core::vault::{DirEntry, NoteMetadata};

/// Result of `status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub status: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub configured: bool,
    #[serde(default)]
    pub uptime_secs: u64,
}

/// Result of `write`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteAck {
    pub status: String,
    pub path: String,
    pub metadata: NoteMetadata,
}

/// Result of `list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub path: String,
    pub entries: Vec<DirEntry>,
}

/// One entry of `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Result of `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolList {
    pub tools: Vec<ToolInfo>,
}
