//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod annotate;
mod config_cmd;
mod helpers;
mod llm;
mod serve;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "lunette")]
#[command(about = "AI annotations for live-coded music patterns")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the annotation HTTP API
    Serve {
        /// Bind address: a port, a host, or host:port (default from config)
        bind: Option<String>,
    },

    /// Annotate a pattern file once and print the results
    Annotate {
        /// Pattern file to analyze
        file: PathBuf,
        /// Free-text context for the analyzer (e.g. the current lesson)
        #[arg(long)]
        context: Option<String>,
        /// Use a Lunette server at this URL instead of calling the LLM directly
        #[arg(long, env = "LUNETTE_REMOTE")]
        remote: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Follow a pattern file and keep its annotations current as it is edited
    Watch {
        /// Pattern file to follow
        file: PathBuf,
        /// Free-text context for the analyzer
        #[arg(long)]
        context: Option<String>,
        /// Use a Lunette server at this URL instead of calling the LLM directly
        #[arg(long, env = "LUNETTE_REMOTE")]
        remote: Option<String>,
    },

    /// LLM backend diagnostics
    Llm {
        #[command(subcommand)]
        command: LlmCommands,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum LlmCommands {
    /// Check whether the configured backend is reachable
    Status,
    /// List models offered by the configured backend
    Models,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_discover(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&config, bind.as_deref()).await,
        Commands::Annotate {
            file,
            context,
            remote,
            json,
        } => {
            annotate::cmd_annotate(&config, &file, context, remote.as_deref(), json).await
        }
        Commands::Watch {
            file,
            context,
            remote,
        } => watch::cmd_watch(&config, &file, context, remote.as_deref()).await,
        Commands::Llm { command } => match command {
            LlmCommands::Status => llm::cmd_llm_status(&config).await,
            LlmCommands::Models => llm::cmd_llm_models(&config).await,
        },
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}
