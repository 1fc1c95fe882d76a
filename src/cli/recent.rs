//! Recent command - List an agent's conversation logs, newest first
//!
//! # Usage
//!
//! ```bash
//! smf recent                      # Claude, 10 entries
//! smf recent --agent GPT --limit 3
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::utils::{connect, print_json};
use super::ClientArgs;
use crate::core::conversation::{sort_by_recency, ConversationStamp};
use crate::core::vault::CONVERSATIONS_DIR;

/// List recent conversation logs
#[derive(Args, Debug)]
pub struct RecentArgs {
    /// Agent whose conversations to list
    #[arg(long, default_value = "Claude")]
    pub agent: String,

    /// Maximum number of entries
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

/// One conversation log, as shown by `recent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentEntry {
    pub path: String,
    pub topic: String,
    /// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`; absent for unparseable names
    pub date: Option<String>,
}

impl RecentEntry {
    fn new(path: String, stamp: Option<ConversationStamp>) -> Self {
        let (topic, date) = match stamp {
            Some(stamp) => (stamp.topic.clone(), Some(stamp.display())),
            None => {
                let file = path.rsplit('/').next().unwrap_or(&path);
                let topic = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
                (topic.to_string(), None)
            }
        };
        Self { path, topic, date }
    }
}

/// Keep the agent's conversation paths and order them by recency
pub fn recent_conversations(paths: Vec<String>, agent: &str, limit: usize) -> Vec<RecentEntry> {
    let prefix = format!("{}/{}/", CONVERSATIONS_DIR, agent);
    let mine: Vec<String> = paths
        .into_iter()
        .filter(|p| p.starts_with(&prefix))
        .collect();

    sort_by_recency(mine)
        .into_iter()
        .take(limit)
        .map(|(path, stamp)| RecentEntry::new(path, stamp))
        .collect()
}

pub async fn run(args: RecentArgs, client_args: &ClientArgs) -> Result<()> {
    let client = connect(client_args)?;
    let paths = client.search(&regex::escape(&args.agent)).await?;
    let entries = recent_conversations(paths, &args.agent, args.limit);

    if client_args.json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("No conversations found for agent '{}'", args.agent);
        return Ok(());
    }

    println!("\nRecent {} conversations:\n", args.agent.bold());
    for (idx, entry) in entries.iter().enumerate() {
        let date = entry.date.as_deref().unwrap_or("undated");
        println!("{}. {} ({})", idx + 1, entry.topic.cyan(), date.dimmed());
        println!("   Path: {}", entry.path);
    }

    println!("\nTo read a conversation: smf read \"{}\"", entries[0].path);
    Ok(())
}
