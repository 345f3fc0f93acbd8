use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::config::{LoggingSection, TaskboardToml};

mod cmd;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Per-user Kanban boards with activity and analytics")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[arg(long, global = true, env = "TASKBOARD_PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the board API over HTTP
    Serve {
        /// Port to serve on (overrides taskboard.toml)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable dev mode (bind all interfaces, permissive CORS)
        #[arg(long)]
        dev: bool,

        /// Start signed out; sign in through POST /api/session
        #[arg(long)]
        no_login: bool,
    },
    /// Load the demo boards, make a few changes and print the result
    Demo {
        /// Board to print
        #[arg(short, long, default_value = "board-1")]
        board: String,

        /// Simulate an unreachable record store
        #[arg(long)]
        offline: bool,
    },
    /// View, validate or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default taskboard.toml file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(logging: &LoggingSection, verbose: bool, json: bool) {
    let default_filter = if verbose {
        "taskboard=debug,tower_http=debug"
    } else {
        logging.filter.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    if json || logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = TaskboardToml::resolve(&project_dir)?;
    init_tracing(&config.logging, cli.verbose, cli.json_logs);

    match &cli.command {
        Commands::Serve {
            port,
            dev,
            no_login,
        } => {
            cmd::cmd_serve(&project_dir, config, *port, *dev, !*no_login).await?;
        }
        Commands::Demo { board, offline } => {
            cmd::cmd_demo(&config, board, *offline).await?;
        }
        Commands::Config { command } => cmd::cmd_config(&project_dir, &config, command.clone())?,
    }

    Ok(())
}
