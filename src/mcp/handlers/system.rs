//! Server-level handlers: initialize, capabilities, status, metadata,
//! tools/list, batch, shutdown, ping

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::mcp::jsonrpc::RpcError;
use crate::mcp::registry::Registry;
use crate::mcp::tools::{parse_params, tool_list, BatchArgs};

pub const SERVER_NAME: &str = "smf";
pub const SERVER_TITLE: &str = "Shared Memory Framework Server";

/// Protocol versions this server speaks, newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

pub const TRANSPORTS: &[&str] = &["http", "jsonrpc", "sse", "lsp", "stdio"];

/// Pick the protocol version to answer with
///
/// A supported client version is echoed; anything else gets the newest.
pub fn negotiate_protocol(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v).copied())
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// Result of `initialize`, also used for the SSE and stdio greetings
pub fn capability_descriptor(registry: &Registry, protocol_version: &str) -> Value {
    json!({
        "protocolVersion": protocol_version,
        "serverInfo": {
            "name": SERVER_NAME,
            "title": SERVER_TITLE,
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": { "listChanged": true },
            "prompts": { "listChanged": true },
            "resources": { "listChanged": true, "subscribe": false }
        },
        "methods": registry.method_names(),
        "tools": tool_list(),
        "configured": registry.state().is_configured(),
        "instructions": concat!(
            "Markdown vault server. Use search to find notes under AI/Memory, ",
            "get/resources/read to read them and write to save new knowledge."
        )
    })
}

/// `initialize`
pub fn initialize(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let requested = params.get("protocolVersion").and_then(Value::as_str);
    let client = params
        .pointer("/clientInfo/name")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let version = negotiate_protocol(requested);
    info!(client, protocol = version, "Client initialized");

    Ok(capability_descriptor(registry, version))
}

/// `capabilities`
pub fn capabilities(registry: &Registry, _params: &Value) -> Result<Value, RpcError> {
    Ok(json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "jsonrpc-2.0",
        "protocolVersions": SUPPORTED_PROTOCOL_VERSIONS,
        "methods": registry.method_names(),
        "tools": tool_list(),
        "transports": TRANSPORTS,
    }))
}

/// `status`
pub fn status(registry: &Registry, _params: &Value) -> Result<Value, RpcError> {
    let state = registry.state();
    Ok(json!({
        "status": "healthy",
        "name": SERVER_TITLE,
        "version": env!("CARGO_PKG_VERSION"),
        "configured": state.is_configured(),
        "uptime_secs": state.uptime_secs(),
    }))
}

/// `metadata` and the `knowledge_summary` tool
pub fn metadata(registry: &Registry, _params: &Value) -> Result<Value, RpcError> {
    let vault = registry.state().vault()?;
    let stats = vault.stats()?;
    let total = stats.contexts + stats.conversations + stats.system_prompts + stats.projects;

    Ok(json!({
        "vault_configured": true,
        "stats": stats,
        "total_notes": total,
    }))
}

/// `tools/list`
pub fn tools_list(_registry: &Registry, _params: &Value) -> Result<Value, RpcError> {
    Ok(json!({ "tools": tool_list() }))
}

/// `batch`
///
/// Operations run in order and each failure is captured in its own entry.
/// Results are keyed by the operation id rendered as a string (`""` when
/// absent); on a duplicate key the later result replaces the earlier one.
pub fn batch(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let args: BatchArgs = parse_params(params)?;

    let mut results = Map::new();
    for op in args.operations {
        let key = batch_key(op.id.as_ref());
        let entry = match registry.call(&op.method, &op.params) {
            Ok(result) => json!({ "result": result }),
            Err(e) => json!({ "error": e }),
        };

        if results.insert(key.clone(), entry).is_some() {
            warn!("Batch id {:?} used more than once; keeping the last result", key);
        }
    }

    Ok(Value::Object(results))
}

fn batch_key(id: Option<&Value>) -> String {
    match id {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `shutdown`
pub fn shutdown(_registry: &Registry, _params: &Value) -> Result<Value, RpcError> {
    info!("Shutdown requested by client");
    Ok(json!({}))
}

/// `ping`
pub fn ping(_registry: &Registry, _params: &Value) -> Result<Value, RpcError> {
    Ok(json!({}))
}
