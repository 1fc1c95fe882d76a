//! Note commands - status, search, read, write, ls
//!
//! # Usage
//!
//! ```bash
//! smf status
//! smf search "terraform|pulumi"
//! smf read AI/Memory/Contexts/Shared/Deploy.md
//! smf write AI/Memory/Contexts/Shared/Deploy.md "# Deploy"
//! smf write AI/Memory/Contexts/Shared/Deploy.md --file deploy.md
//! smf ls AI/Memory/Contexts
//! ```

use std::io::Read as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::utils::{connect, header, print_json, success};
use super::ClientArgs;
use crate::core::vault::{DirEntry, EntryKind};

pub async fn status(client_args: &ClientArgs) -> Result<()> {
    let client = connect(client_args)?;
    let status = client.status().await?;

    if client_args.json {
        return print_json(&status);
    }

    println!("{} {}", "●".green(), status.status.green().bold());
    println!("  Server:     {} {}", status.name, status.version.dimmed());
    println!(
        "  Vault:      {}",
        if status.configured {
            "configured".green()
        } else {
            "not configured".yellow()
        }
    );
    println!("  Uptime:     {}s", status.uptime_secs);
    println!("  Endpoint:   {}", client.endpoint());
    Ok(())
}

/// Search notes
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Case-insensitive regular expression
    pub query: String,
}

pub async fn search(args: SearchArgs, client_args: &ClientArgs) -> Result<()> {
    let client = connect(client_args)?;
    let paths = client.search(&args.query).await?;

    if client_args.json {
        return print_json(&paths);
    }

    if paths.is_empty() {
        println!("No notes match '{}'", args.query);
        return Ok(());
    }

    for path in &paths {
        println!("{}", path.cyan());
    }
    println!("\n{} note(s)", paths.len());
    Ok(())
}

/// Print notes
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Vault-relative note paths
    #[arg(required = true)]
    pub paths: Vec<String>,
}

pub async fn read(args: ReadArgs, client_args: &ClientArgs) -> Result<()> {
    let client = connect(client_args)?;

    let mut notes = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let note = client
            .read(path)
            .await
            .with_context(|| format!("Failed to read {}", path))?;
        notes.push(note);
    }

    if client_args.json {
        return print_json(&notes);
    }

    let several = notes.len() > 1;
    for note in &notes {
        if several {
            header(&note.path, 60);
        }
        print!("{}", note.content);
        if !note.content.ends_with('\n') {
            println!();
        }
        if several {
            println!();
        }
    }
    Ok(())
}

/// Create or replace a note
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Vault-relative note path (must end in .md or .markdown)
    pub path: String,

    /// Note content (reads stdin when neither this nor --file is given)
    #[arg(conflicts_with = "file")]
    pub content: Option<String>,

    /// Read the content from a file
    #[arg(long, short)]
    pub file: Option<PathBuf>,
}

pub async fn write(args: WriteArgs, client_args: &ClientArgs) -> Result<()> {
    let content = match (args.content, args.file) {
        (Some(content), _) => content,
        (None, Some(file)) => std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read content from stdin")?;
            buf
        }
    };

    let client = connect(client_args)?;
    let ack = client.write(&args.path, &content).await?;

    if client_args.json {
        return print_json(&ack);
    }

    success(format!(
        "Wrote {} ({} bytes)",
        ack.path.cyan(),
        ack.metadata.size
    ));
    Ok(())
}

/// List a vault directory
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Vault-relative directory (default: vault root)
    #[arg(default_value = "")]
    pub path: String,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Path")]
    path: String,
}

impl From<&DirEntry> for EntryRow {
    fn from(entry: &DirEntry) -> Self {
        let name = match entry.kind {
            EntryKind::Directory => format!("{}/", entry.name),
            EntryKind::File => entry.name.clone(),
        };
        Self {
            name,
            kind: entry.kind.to_string(),
            path: entry.path.clone(),
        }
    }
}

/// Render a listing as a table
pub fn entries_table(entries: &[DirEntry]) -> String {
    let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub async fn ls(args: LsArgs, client_args: &ClientArgs) -> Result<()> {
    let client = connect(client_args)?;
    let listing = client.list(&args.path).await?;

    if client_args.json {
        return print_json(&listing);
    }

    let shown = if listing.path.is_empty() { "/" } else { &listing.path };
    if listing.entries.is_empty() {
        println!("{} is empty", shown);
        return Ok(());
    }

    println!("{}", entries_table(&listing.entries));
    let count = listing.entries.len();
    println!("{} entr{}", count, if count == 1 { "y" } else { "ies" });
    Ok(())
}
