//! CLI module - Command definitions
//!
//! `serve` runs the server in-process; every other command is a thin client
//! that talks JSON-RPC to a running server (see [`crate::remote`]).

use clap::{Args, Parser, Subcommand};

pub mod create;
pub mod notes;
pub mod recent;
pub mod rpc;
pub mod serve;
pub mod templates;
pub mod utils;

/// smf - Shared Memory Framework
///
/// Markdown vault knowledge server for AI assistants, and a client for it.
#[derive(Parser, Debug)]
#[command(name = "smf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every client command
#[derive(Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// Server URL (default: client config, else http://localhost:5678)
    #[arg(long, global = true, env = "SMF_SERVER_URL")]
    pub server: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the knowledge server
    Serve(serve::ServeArgs),

    /// Show server status
    Status,

    /// Search notes (regex over paths and content)
    Search(notes::SearchArgs),

    /// Print one or more notes
    Read(notes::ReadArgs),

    /// Create or replace a note
    Write(notes::WriteArgs),

    /// List a vault directory
    Ls(notes::LsArgs),

    /// List recent conversation logs for an agent
    Recent(recent::RecentArgs),

    /// Create a conversation log from the standard template
    Conversation(create::ConversationArgs),

    /// Create a context note from the standard template
    Context(create::ContextArgs),

    /// Create a system prompt from the standard template
    Prompt(create::PromptArgs),

    /// List the tools the server exposes
    Tools,

    /// Send a raw JSON-RPC call
    Call(rpc::CallArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "smf",
            "search",
            "terraform",
            "--server",
            "http://example:1",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.client.server.as_deref(), Some("http://example:1"));
        assert!(cli.client.json);
        assert!(matches!(cli.command, Commands::Search(_)));
    }

    #[test]
    fn test_read_takes_several_paths() {
        let cli = Cli::try_parse_from(["smf", "read", "a.md", "b.md"]).unwrap();
        match cli.command {
            Commands::Read(args) => assert_eq!(args.paths, vec!["a.md", "b.md"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_read_requires_a_path() {
        assert!(Cli::try_parse_from(["smf", "read"]).is_err());
    }
}
