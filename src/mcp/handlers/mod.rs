//! Method handlers
//!
//! Each module handles a group of related methods. Tools invoked through
//! `tools/call` reuse the same handlers.

pub mod notes;
pub mod prompts;
pub mod search;
pub mod system;

use serde_json::{json, Value};

use super::jsonrpc::RpcError;
use super::registry::Registry;
use super::tools::{find_tool, parse_params, ToolCallArgs};

/// Dispatch a tool call to the appropriate handler
///
/// Tools are looked up by name or id in the descriptor table.
pub fn dispatch_tool(registry: &Registry, name: &str, args: &Value) -> Result<Value, RpcError> {
    let tool = find_tool(name)
        .ok_or_else(|| RpcError::invalid_params(format!("Unknown tool: {}", name)))?;

    match tool.name {
        "search" => search::search(registry, args),
        "create_note" => notes::create_note(registry, args),
        "context_search" => search::context_search(registry, args),
        "conversation_search" => search::conversation_search(registry, args),
        "knowledge_summary" => system::metadata(registry, args),
        "batch" => system::batch(registry, args),
        _ => Err(RpcError::invalid_params(format!("Unknown tool: {}", name))),
    }
}

/// `tools/call`
pub fn tools_call(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let call: ToolCallArgs = parse_params(params)?;
    let result = dispatch_tool(registry, &call.tool, &call.params)?;

    let text = serde_json::to_string_pretty(&result)
        .map_err(|e| RpcError::internal(format!("Failed to encode tool result: {}", e)))?;

    Ok(json!({
        "content": [{
            "type": "text",
            "text": text
        }],
        "structuredContent": result,
        "isError": false
    }))
}


#[cfg(test)]
mod tests {
    use super::testing::registry;
    use super::*;
    use crate::mcp::jsonrpc::{INVALID_PARAMS, NOT_FOUND};

    #[test]
    fn test_tools_call_wraps_result() {
        let (_dir, registry) = registry();
        registry
            .call("write", &json!({"path": "AI/Memory/n.md", "content": "needle"}))
            .unwrap();

        let result = registry
            .call("tools/call", &json!({"tool": "search", "params": {"query": "needle"}}))
            .unwrap();

        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["structuredContent"], json!(["AI/Memory/n.md"]));
    }

    #[test]
    fn test_tools_call_name_arguments_form() {
        let (_dir, registry) = registry();
        let result = registry
            .call("tools/call", &json!({"name": "knowledge_summary", "arguments": {}}))
            .unwrap();
        assert_eq!(result["structuredContent"]["vault_configured"], true);
    }

    #[test]
    fn test_every_listed_tool_dispatches() {
        let (_dir, registry) = registry();
        for tool in crate::mcp::tools::TOOLS {
            for name in [tool.name, tool.id] {
                if let Err(e) = dispatch_tool(&registry, name, &json!({})) {
                    assert!(!e.message.starts_with("Unknown tool"), "{}", name);
                }
            }
        }
    }

    #[test]
    fn test_unknown_tool_is_invalid_params() {
        let (_dir, registry) = registry();
        let err = registry
            .call("tools/call", &json!({"tool": "rm_rf", "params": {}}))
            .unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[test]
    fn test_tool_errors_keep_their_code() {
        let (_dir, registry) = registry();
        let err = registry
            .call(
                "tools/call",
                &json!({"tool": "batch", "params": {"operations": "nope"}}),
            )
            .unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);

        let err = dispatch_tool(&registry, "smf/search", &json!({"query": "("})).unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
        assert_ne!(err.code, NOT_FOUND);
    }
}
