//! Carbon - start and stop groups of containerized services
//!
//! This is the main CLI entry point for Carbon.

use anyhow::Context as _;
use carbon::commands::shell::ShellOptions;
use carbon::commands::show::ShowOptions;
use carbon::commands::{self, Context};
use carbon::config::Settings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Carbon - containerized service groups
#[derive(Parser)]
#[command(name = "carbon")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Start and stop groups of services declared across carbon stores", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start services as one group
    Start {
        /// Service names
        #[arg(required = true)]
        names: Vec<String>,
        /// Stop running instances of these services first
        #[arg(short, long)]
        force: bool,
    },

    /// Stop services or containers
    Stop {
        /// Service or container names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show running containers, stores or available services
    Show {
        /// Show running containers
        #[arg(short, long)]
        running: bool,
        /// Show registered stores
        #[arg(short, long)]
        stores: bool,
        /// Show available carbon services
        #[arg(short, long)]
        carbon: bool,
    },

    /// Manage stores
    #[command(subcommand)]
    Store(StoreCommands),

    /// Print the command opening a shell in a running container
    Shell {
        /// Container key, as listed by `show --running`
        id: String,
        /// Use /bin/sh instead of /bin/bash
        #[arg(short, long)]
        sh: bool,
        /// Use a custom shell
        #[arg(short, long)]
        custom: Option<String>,
    },

    /// Show the logs of containers
    Logs {
        /// Container keys or service names
        #[arg(required = true)]
        names: Vec<String>,
        /// Follow log output
        #[arg(short, long)]
        follow: bool,
    },
}

#[derive(Subcommand)]
enum StoreCommands {
    /// Register a store directory
    Add {
        /// Store directory
        #[arg(short, long)]
        store: PathBuf,
        /// Store id, derived from the path when omitted
        #[arg(short, long)]
        id: Option<String>,
        /// Environment file passed to compose for this store's services
        #[arg(short, long)]
        env: Option<PathBuf>,
    },
    /// Remove stores
    Remove {
        /// Store ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env();
    let home = settings.home.clone();
    let context = Context::open(settings)
        .await
        .with_context(|| format!("failed to open carbon home {}", home.display()))?;

    match cli.command {
        Commands::Start { names, force } => {
            commands::lifecycle::start(&context, &names, force).await?;
        }

        Commands::Stop { names } => {
            commands::lifecycle::stop(&context, &names).await?;
        }

        Commands::Show {
            running,
            stores,
            carbon,
        } => {
            let options = ShowOptions {
                running,
                stores,
                carbon,
            };
            commands::show::show(&context, options).await?;
        }

        Commands::Store(store_cmd) => match store_cmd {
            StoreCommands::Add { store, id, env } => {
                commands::store::add(&context, &store, id.as_deref(), env.as_deref()).await?;
            }
            StoreCommands::Remove { ids } => {
                commands::store::remove(&context, &ids).await?;
            }
        },

        Commands::Shell { id, sh, custom } => {
            commands::shell::shell(&context, &id, &ShellOptions { sh, custom }).await?;
        }

        Commands::Logs { names, follow } => {
            commands::logs::logs(&context, &names, follow).await?;
        }
    }

    Ok(())
}
