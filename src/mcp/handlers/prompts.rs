//! System prompt handlers: prompts/list, prompts/get
//!
//! Prompts are the notes under `AI/Memory/System_Prompts`. A prompt's id is
//! its path below that directory without the extension, e.g.
//! `Shared/Code_Review`.

use serde_json::{json, Value};

use crate::core::frontmatter::{self, Frontmatter};
use crate::core::vault::{Note, Vault, PROMPTS_DIR};
use crate::mcp::jsonrpc::RpcError;
use crate::mcp::registry::Registry;
use crate::mcp::tools::{parse_params, PromptGetArgs};

/// `prompts/list`
pub fn list(registry: &Registry, _params: &Value) -> Result<Value, RpcError> {
    let vault = registry.state().vault()?;

    let mut prompts = Vec::new();
    for path in vault.notes_under(PROMPTS_DIR)? {
        match vault.read(&path) {
            Ok(note) => prompts.push(describe(&note).0),
            Err(e) => tracing::warn!("Skipping prompt {}: {}", path, e),
        }
    }

    Ok(json!({ "prompts": prompts }))
}

/// `prompts/get`
pub fn get(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let args: PromptGetArgs = parse_params(params)?;
    let vault = registry.state().vault()?;

    let path = find_prompt(&vault, &args.id)?
        .ok_or_else(|| RpcError::not_found(format!("prompt {}", args.id)))?;
    let note = vault.read(&path)?;

    let (mut prompt, body) = describe(&note);
    prompt["content"] = json!(note.content);
    prompt["messages"] = json!([{
        "role": "user",
        "content": { "type": "text", "text": body.trim() }
    }]);

    Ok(prompt)
}

fn find_prompt(vault: &Vault, id: &str) -> Result<Option<String>, RpcError> {
    let id = id.trim().trim_matches('/');
    Ok(vault
        .notes_under(PROMPTS_DIR)?
        .into_iter()
        .find(|path| prompt_id(path) == id || path.as_str() == id))
}

/// Summary object for a prompt, plus the body without frontmatter
fn describe(note: &Note) -> (Value, &str) {
    let (fm, body) = frontmatter::split(&note.content);
    let fm = fm.unwrap_or_default();
    let id = prompt_id(&note.path);
    let stem = id.rsplit('/').next().unwrap_or(&id).to_string();

    let name = fm.get("title").or_else(|| fm.get("name")).unwrap_or(&stem).to_string();
    let description = fm
        .get("description")
        .map(str::to_string)
        .unwrap_or_else(|| first_paragraph(body));

    let prompt = json!({
        "id": id,
        "name": name,
        "description": description,
        "path": note.path,
        "metadata": metadata(&fm),
    });
    (prompt, body)
}

fn prompt_id(path: &str) -> String {
    let rel = path
        .strip_prefix(PROMPTS_DIR)
        .map(|p| p.trim_start_matches('/'))
        .unwrap_or(path);
    match rel.rsplit_once('.') {
        Some((stem, _)) if !stem.ends_with('/') && !stem.is_empty() => stem.to_string(),
        _ => rel.to_string(),
    }
}

fn metadata(fm: &Frontmatter) -> Value {
    json!(fm.fields())
}

/// First line of prose, skipping headings
fn first_paragraph(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .unwrap_or_default()
        .to_string()
}
