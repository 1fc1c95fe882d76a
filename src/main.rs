//! smf CLI - Entry point
//!
//! Usage: smf <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use smf::cli::{create, notes, recent, rpc, serve, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries stdio frames and command output; logs go to stderr
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let client = &cli.client;
    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Status => notes::status(client).await,
        Commands::Search(args) => notes::search(args, client).await,
        Commands::Read(args) => notes::read(args, client).await,
        Commands::Write(args) => notes::write(args, client).await,
        Commands::Ls(args) => notes::ls(args, client).await,
        Commands::Recent(args) => recent::run(args, client).await,
        Commands::Conversation(args) => create::conversation(args, client).await,
        Commands::Context(args) => create::context(args, client).await,
        Commands::Prompt(args) => create::prompt(args, client).await,
        Commands::Tools => rpc::tools(client).await,
        Commands::Call(args) => rpc::call(args, client).await,
    }
}
