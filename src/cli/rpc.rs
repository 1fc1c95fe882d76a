//! Protocol commands - tools, call
//!
//! # Usage
//!
//! ```bash
//! smf tools
//! smf call ping
//! smf call tools/call '{"name": "search", "arguments": {"query": "deploy"}}'
//! ```

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use super::utils::{connect, header, print_json};
use super::ClientArgs;

pub async fn tools(client_args: &ClientArgs) -> Result<()> {
    let client = connect(client_args)?;
    let list = client.tools().await?;

    if client_args.json {
        return print_json(&list);
    }

    header("Tools", 60);
    for tool in &list.tools {
        println!("{}  {}", tool.name.cyan().bold(), tool.id.dimmed());
        if !tool.description.is_empty() {
            println!("   {}", tool.description);
        }
    }
    println!("\n{} tool(s)", list.tools.len());
    Ok(())
}

/// Send a raw JSON-RPC call
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Method name (e.g., initialize, tools/list, search)
    pub method: String,

    /// Params as a JSON object or array
    pub params: Option<String>,
}

/// Parse the optional params argument; missing means `{}`
pub fn parse_params(raw: Option<&str>) -> Result<Value> {
    match raw {
        None => Ok(Value::Object(Default::default())),
        Some(raw) => serde_json::from_str(raw).context("Params must be valid JSON"),
    }
}

pub async fn call(args: CallArgs, client_args: &ClientArgs) -> Result<()> {
    let params = parse_params(args.params.as_deref())?;
    let client = connect(client_args)?;
    let response = client.request(&args.method, params).await?;

    if client_args.json {
        print_json(&response)?;
    } else if let Some(result) = &response.result {
        print_json(result)?;
    }

    if let Some(error) = response.error {
        bail!("Server error {}: {}", error.code, error.message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_params() {
        assert_eq!(parse_params(None).unwrap(), json!({}));
        assert_eq!(
            parse_params(Some(r#"{"query": "x"}"#)).unwrap(),
            json!({"query": "x"})
        );
        assert!(parse_params(Some("{oops")).is_err());
    }
}
