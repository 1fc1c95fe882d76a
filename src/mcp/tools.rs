//! Tool argument structs and the static tool descriptor table
//!
//! Every adapter that advertises tools (`tools/list`, `initialize`, SSE,
//! `/tools`) renders the same [`TOOLS`] table.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::jsonrpc::RpcError;

/// Search the memory subtree
#[derive(Debug, Deserialize, Serialize)]
pub struct SearchArgs {
    /// Case-insensitive regular expression
    pub query: String,
}

/// Read one note
#[derive(Debug, Deserialize, Serialize)]
pub struct ReadArgs {
    /// Vault-relative note path
    pub path: String,
}

/// List a directory
#[derive(Debug, Deserialize, Serialize)]
pub struct ListArgs {
    /// Vault-relative directory (default: vault root)
    #[serde(default)]
    pub path: String,
}

/// Write (create or overwrite) a note
#[derive(Debug, Deserialize, Serialize)]
pub struct WriteArgs {
    pub path: String,
    pub content: String,
}

/// Create a note with a generated heading
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateNoteArgs {
    pub path: String,
    pub content: String,
    /// Heading text (default: file stem)
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Search the contexts subtree
#[derive(Debug, Deserialize, Serialize)]
pub struct ContextSearchArgs {
    pub query: String,
    /// Category directory below `AI/Memory/Contexts`
    #[serde(default)]
    pub category: Option<String>,
}

/// Search the conversations subtree
#[derive(Debug, Deserialize, Serialize)]
pub struct ConversationSearchArgs {
    pub query: String,
    /// Agent directory below `AI/Memory/Conversations`
    #[serde(default)]
    pub agent: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD` or `YYYYMMDD`
    #[serde(default)]
    pub date_from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD` or `YYYYMMDD`
    #[serde(default)]
    pub date_to: Option<String>,
}

/// Run several methods in one call
#[derive(Debug, Deserialize, Serialize)]
pub struct BatchArgs {
    pub operations: Vec<BatchOperation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchOperation {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

/// Fetch one system prompt
#[derive(Debug, Deserialize, Serialize)]
pub struct PromptGetArgs {
    /// Prompt id (path below `AI/Memory/System_Prompts` without extension)
    pub id: String,
}

/// `tools/call` envelope, accepting both `{tool, params}` and
/// `{name, arguments}`
#[derive(Debug, Deserialize, Serialize)]
pub struct ToolCallArgs {
    #[serde(alias = "name")]
    pub tool: String,
    #[serde(default, alias = "arguments")]
    pub params: Value,
}

/// Deserialize handler parameters
///
/// `null` params count as an empty object; any shape mismatch is
/// InvalidParams.
pub fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, RpcError> {
    let value = if params.is_null() {
        json!({})
    } else {
        params.clone()
    };
    serde_json::from_value(value)
        .map_err(|e| RpcError::invalid_params(format!("Invalid params: {}", e)))
}

/// One advertised tool
#[derive(Debug)]
pub struct ToolDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> Value,
}

impl ToolDescriptor {
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "inputSchema": (self.input_schema)(),
        })
    }
}

pub static TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        id: "smf/search",
        name: "search",
        description: concat!(
            "Search notes under AI/Memory. The query is a case-insensitive regular expression ",
            "matched against file names and note content. ",
            "Example: search({\"query\": \"terraform\"})"
        ),
        input_schema: search_schema,
    },
    ToolDescriptor {
        id: "smf/create_note",
        name: "create_note",
        description: concat!(
            "Create or overwrite a note with a '# title' heading and optional tags. ",
            "Example: create_note({\"path\": \"AI/Memory/Contexts/Shared/Deploy.md\", ",
            "\"content\": \"Steps...\", \"tags\": [\"ops\"]})"
        ),
        input_schema: create_note_schema,
    },
    ToolDescriptor {
        id: "smf/context_search",
        name: "context_search",
        description: concat!(
            "Search context notes under AI/Memory/Contexts, ",
            "optionally limited to one category directory."
        ),
        input_schema: context_search_schema,
    },
    ToolDescriptor {
        id: "smf/conversation_search",
        name: "conversation_search",
        description: concat!(
            "Search conversation logs under AI/Memory/Conversations, optionally filtered by agent ",
            "and by the date in the file name (YYYYMMDD[-HHMM]-Topic.md)."
        ),
        input_schema: conversation_search_schema,
    },
    ToolDescriptor {
        id: "smf/knowledge_summary",
        name: "knowledge_summary",
        description: concat!(
            "Summarize the vault: whether it is configured ",
            "and how many notes each memory category holds."
        ),
        input_schema: empty_schema,
    },
    ToolDescriptor {
        id: "smf/batch",
        name: "batch",
        description: concat!(
            "Run several methods in one call. Results are keyed by each operation's id. ",
            "Example: batch({\"operations\": [{\"id\": \"a\", \"method\": \"get\", ",
            "\"params\": {\"path\": \"x.md\"}}]})"
        ),
        input_schema: batch_schema,
    },
];

/// Descriptor list as JSON
pub fn tool_list() -> Vec<Value> {
    TOOLS.iter().map(ToolDescriptor::to_json).collect()
}

pub fn find_tool(name: &str) -> Option<&'static ToolDescriptor> {
    TOOLS.iter().find(|t| t.name == name || t.id == name)
}

fn search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "Case-insensitive regular expression" }
        },
        "required": ["query"]
    })
}

fn create_note_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Vault-relative path ending in .md, .markdown or .txt"
            },
            "content": { "type": "string", "description": "Note body in Markdown" },
            "title": {
                "type": "string",
                "description": "Heading (default: file name without extension)"
            },
            "tags": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["path", "content"]
    })
}

fn context_search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "Case-insensitive regular expression" },
            "category": { "type": "string", "description": "Category directory, e.g. 'Shared'" }
        },
        "required": ["query"]
    })
}

fn conversation_search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "Case-insensitive regular expression" },
            "agent": { "type": "string", "description": "Agent directory, e.g. 'Claude'" },
            "date_from": { "type": "string", "description": "YYYY-MM-DD, inclusive" },
            "date_to": { "type": "string", "description": "YYYY-MM-DD, inclusive" }
        },
        "required": ["query"]
    })
}

fn batch_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "operations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "method": { "type": "string" },
                        "params": { "type": "object" },
                        "id": {}
                    },
                    "required": ["method"]
                }
            }
        },
        "required": ["operations"]
    })
}

fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}
