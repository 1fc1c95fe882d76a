//! Note handlers: get, list, write, create_note

use serde_json::{json, Value};

use crate::core::path::NotePath;
use crate::mcp::jsonrpc::RpcError;
use crate::mcp::registry::Registry;
use crate::mcp::tools::{parse_params, CreateNoteArgs, ListArgs, ReadArgs, WriteArgs};

/// `get` / `resources/read`
pub fn get(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let args: ReadArgs = parse_params(params)?;
    let vault = registry.state().vault()?;

    let note = vault.read(&args.path)?;
    to_value(note)
}

/// `list` / `resources/list`
pub fn list(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let args: ListArgs = parse_params(params)?;
    let vault = registry.state().vault()?;

    let entries = vault.list(&args.path)?;
    Ok(json!({
        "path": display_path(&args.path),
        "entries": to_value(entries)?,
    }))
}

/// `write` / `resources/write`
pub fn write(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let args: WriteArgs = parse_params(params)?;
    write_note(registry, &args.path, &args.content)
}

/// `create_note` tool
pub fn create_note(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let args: CreateNoteArgs = parse_params(params)?;

    let note_path = NotePath::parse(&args.path)
        .map_err(|e| RpcError::invalid_params(e.to_string()))?;
    let title = match &args.title {
        Some(title) if !title.trim().is_empty() => title.trim().to_string(),
        _ => note_path.stem().unwrap_or_default().to_string(),
    };

    let content = render_note(&title, &args.content, &args.tags);
    write_note(registry, &args.path, &content)
}

fn write_note(registry: &Registry, path: &str, content: &str) -> Result<Value, RpcError> {
    let vault = registry.state().vault()?;
    let metadata = vault.write(path, content)?;

    Ok(json!({
        "status": "success",
        "path": display_path(path),
        "metadata": to_value(metadata)?,
    }))
}

/// Heading, body and an optional tag line
pub fn render_note(title: &str, body: &str, tags: &[String]) -> String {
    let mut out = format!("# {}\n\n{}", title, body.trim_end());
    out.push('\n');
    if !tags.is_empty() {
        let tags: Vec<_> = tags.iter().map(|t| format!("#{}", t.trim_start_matches('#'))).collect();
        out.push_str(&format!("\nTags: {}\n", tags.join(" ")));
    }
    out
}

fn display_path(raw: &str) -> String {
    NotePath::parse(raw)
        .map(|p| p.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::handlers::testing::registry;
    use crate::mcp::jsonrpc::{INVALID_PARAMS, NOT_FOUND};

    #[test]
    fn test_write_then_get() {
        let (_dir, registry) = registry();
        let written = registry
            .call(
                "write",
                &json!({"path": "/AI/Memory/Contexts/Test/Note.md", "content": "# Hello"}),
            )
            .unwrap();
        assert_eq!(written["status"], "success");
        assert_eq!(written["path"], "AI/Memory/Contexts/Test/Note.md");
        assert_eq!(written["metadata"]["size"], 7);

        let note = registry
            .call("resources/read", &json!({"path": "AI/Memory/Contexts/Test/Note.md"}))
            .unwrap();
        assert_eq!(note["content"], "# Hello");
    }

    #[test]
    fn test_missing_params_before_vault() {
        let (_dir, registry) = registry();
        let err = registry.call("get", &json!({})).unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
        let err = registry.call("write", &json!({"path": "a.md"})).unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[test]
    fn test_get_missing_and_traversal_are_not_found() {
        let (_dir, registry) = registry();
        for path in ["missing.md", "../../etc/passwd"] {
            let err = registry.call("get", &json!({ "path": path })).unwrap_err();
            assert_eq!(err.code, NOT_FOUND);
        }
    }

    #[test]
    fn test_write_traversal_is_invalid_params() {
        let (dir, registry) = registry();
        let err = registry
            .call("write", &json!({"path": "../escape.md", "content": "x"}))
            .unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
        assert!(!dir.path().parent().unwrap().join("escape.md").exists());
    }

    #[test]
    fn test_list_defaults_to_root() {
        let (_dir, registry) = registry();
        registry
            .call("write", &json!({"path": "AI/Memory/a.md", "content": "a"}))
            .unwrap();

        let root = registry.call("list", &Value::Null).unwrap();
        assert_eq!(root["path"], "");
        assert_eq!(root["entries"][0]["name"], "AI");
        assert_eq!(root["entries"][0]["kind"], "directory");

        let err = registry
            .call("resources/list", &json!({"path": "nope"}))
            .unwrap_err();
        assert_eq!(err.code, NOT_FOUND);
    }

    #[test]
    fn test_create_note_renders_heading() {
        let (_dir, registry) = registry();
        registry
            .call(
                "tools/call",
                &json!({"tool": "create_note", "params": {
                    "path": "AI/Memory/Contexts/Shared/Deploy.md",
                    "content": "Steps here",
                    "tags": ["ops", "#infra"]
                }}),
            )
            .unwrap();

        let note = registry
            .call("get", &json!({"path": "AI/Memory/Contexts/Shared/Deploy.md"}))
            .unwrap();
        assert_eq!(note["content"], "# Deploy\n\nSteps here\n\nTags: #ops #infra\n");
    }

    #[test]
    fn test_render_note_with_title_no_tags() {
        assert_eq!(render_note("Title", "Body\n\n", &[]), "# Title\n\nBody\n");
    }
}
