//! Template commands - conversation, context, prompt
//!
//! Each renders a fixed markdown template locally and stores it with `write`.
//!
//! # Usage
//!
//! ```bash
//! smf conversation Claude Vault-Design --content "- Chose plain markdown"
//! smf context Shared "Deploy Process"
//! smf prompt Claude Reviewer --content "Review diffs for correctness."
//! ```

use anyhow::Result;
use chrono::Local;
use clap::Args;
use colored::Colorize;

use super::templates::{self, Rendered};
use super::utils::{connect, print_json, success};
use super::ClientArgs;

/// Create a conversation log
#[derive(Args, Debug)]
pub struct ConversationArgs {
    /// Agent name (e.g., Claude, GPT)
    pub agent: String,

    /// Conversation topic (becomes part of the file name)
    pub topic: String,

    /// Initial conversation content
    #[arg(long)]
    pub content: Option<String>,

    /// Project the conversation belongs to
    #[arg(long)]
    pub project: Option<String>,
}

/// Create a context note
#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Category (e.g., Shared, Claude)
    pub category: String,

    /// Context name
    pub name: String,

    /// Overview text
    #[arg(long)]
    pub content: Option<String>,
}

/// Create a system prompt
#[derive(Args, Debug)]
pub struct PromptArgs {
    /// Category (e.g., Shared, Claude)
    pub category: String,

    /// Prompt name
    pub name: String,

    /// Prompt instructions
    #[arg(long)]
    pub content: Option<String>,
}

pub async fn conversation(args: ConversationArgs, client_args: &ClientArgs) -> Result<()> {
    let note = templates::conversation(
        &args.agent,
        &args.topic,
        args.content.as_deref(),
        args.project.as_deref(),
        Local::now().naive_local(),
    );
    store(note, "conversation log", client_args).await
}

pub async fn context(args: ContextArgs, client_args: &ClientArgs) -> Result<()> {
    let note = templates::context(
        &args.category,
        &args.name,
        args.content.as_deref(),
        Local::now().naive_local(),
    );
    store(note, "context", client_args).await
}

pub async fn prompt(args: PromptArgs, client_args: &ClientArgs) -> Result<()> {
    let note = templates::prompt(
        &args.category,
        &args.name,
        args.content.as_deref(),
        Local::now().naive_local(),
    );
    store(note, "system prompt", client_args).await
}

async fn store(note: Rendered, what: &str, client_args: &ClientArgs) -> Result<()> {
    let client = connect(client_args)?;
    let ack = client.write(&note.path, &note.content).await?;

    if client_args.json {
        return print_json(&ack);
    }

    success(format!("Created {}: {}", what, ack.path.cyan()));
    Ok(())
}
