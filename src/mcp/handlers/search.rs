//! Search handlers: search, context_search, conversation_search

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::core::conversation::{parse_date_arg, ConversationStamp};
use crate::core::path::NotePath;
use crate::core::vault::{compile_query, CONTEXTS_DIR, CONVERSATIONS_DIR};
use crate::mcp::jsonrpc::RpcError;
use crate::mcp::registry::Registry;
use crate::mcp::tools::{parse_params, ContextSearchArgs, ConversationSearchArgs, SearchArgs};

/// `search`
pub fn search(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let args: SearchArgs = parse_params(params)?;
    require_query(&args.query)?;
    let pattern = compile_query(&args.query)?;
    let vault = registry.state().vault()?;

    Ok(json!(vault.search(&pattern)?))
}

/// `context_search` tool
pub fn context_search(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let args: ContextSearchArgs = parse_params(params)?;
    require_query(&args.query)?;
    let pattern = compile_query(&args.query)?;
    let vault = registry.state().vault()?;

    let results: Vec<String> = vault
        .search_under(CONTEXTS_DIR, &pattern)?
        .into_iter()
        .filter(|path| match &args.category {
            Some(category) => first_segment_below(path, CONTEXTS_DIR)
                .map(|seg| seg.eq_ignore_ascii_case(category))
                .unwrap_or(false),
            None => true,
        })
        .collect();

    Ok(json!(results))
}

/// `conversation_search` tool
///
/// With a date bound set, files whose names carry no parseable date are
/// excluded.
pub fn conversation_search(registry: &Registry, params: &Value) -> Result<Value, RpcError> {
    let args: ConversationSearchArgs = parse_params(params)?;
    require_query(&args.query)?;
    let from = date_bound(args.date_from.as_deref(), "date_from")?;
    let to = date_bound(args.date_to.as_deref(), "date_to")?;
    let pattern = compile_query(&args.query)?;
    let vault = registry.state().vault()?;

    let results: Vec<String> = vault
        .search_under(CONVERSATIONS_DIR, &pattern)?
        .into_iter()
        .filter(|path| match &args.agent {
            Some(agent) => first_segment_below(path, CONVERSATIONS_DIR)
                .map(|seg| seg.eq_ignore_ascii_case(agent))
                .unwrap_or(false),
            None => true,
        })
        .filter(|path| {
            if from.is_none() && to.is_none() {
                return true;
            }
            let Some(stamp) = ConversationStamp::parse(path) else {
                return false;
            };
            from.map_or(true, |d| stamp.date >= d) && to.map_or(true, |d| stamp.date <= d)
        })
        .collect();

    Ok(json!(results))
}

fn require_query(query: &str) -> Result<(), RpcError> {
    if query.is_empty() {
        return Err(RpcError::invalid_params("query must not be empty"));
    }
    Ok(())
}

fn date_bound(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, RpcError> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_date_arg(s).map(Some).ok_or_else(|| {
            RpcError::invalid_params(format!(
                "{} must be YYYY-MM-DD or YYYYMMDD, got {:?}",
                field, s
            ))
        }),
    }
}

/// Directory segment right below `base` (category or agent), only for
/// notes nested at least one level deeper
fn first_segment_below(path: &str, base: &str) -> Option<String> {
    let path = NotePath::parse(path).ok()?;
    let base = NotePath::parse(base).ok()?;
    match path.strip_prefix(&base)? {
        [first, _, ..] => Some(first.clone()),
        _ => None,
    }
}
