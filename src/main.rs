//! # Paper Analyzer CLI (`paper-analyzer`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `paper-analyzer init` | Create the SQLite database and schema |
//! | `paper-analyzer serve` | Start the HTTP server |
//! | `paper-analyzer analyze <file>` | Extract fields from a local file |
//! | `paper-analyzer users list` | List submitted names, newest first |
//! | `paper-analyzer users add <name>` | Submit a name |
//!
//! Logs go to stderr and honour `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use paper_analyzer::{analyze, config, migrate, server, users};

/// Paper Analyzer — structured field extraction for research papers.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. The remote extractor credential is read from the environment
/// variable named by `[extractor].api_key_env` (default `OPENAI_API_KEY`).
#[derive(Parser)]
#[command(name = "paper-analyzer", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/analyzer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Extract the six fields from a local text file and print them as JSON.
    ///
    /// Runs without a config file, using defaults.
    Analyze {
        /// Path to the document.
        path: PathBuf,

        /// Skip the remote extractor even if a credential is configured.
        #[arg(long)]
        heuristic: bool,
    },

    /// Manage submitted names.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List all names, newest first.
    List,
    /// Add a name. Whitespace-only names are ignored.
    Add {
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Analyze { path, heuristic } = &cli.command {
        let cfg = if cli.config.exists() {
            config::load_config(&cli.config)?
        } else {
            config::Config::minimal()
        };
        return analyze::run_analyze(&cfg, path, *heuristic).await;
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Users { action } => match action {
            UsersAction::List => users::run_list(&cfg).await?,
            UsersAction::Add { name } => users::run_add(&cfg, &name).await?,
        },
        Commands::Analyze { .. } => {
            // Handled above (config is optional)
            unreachable!()
        }
    }

    Ok(())
}
