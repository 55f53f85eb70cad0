//! Command line interface.
//!
//! Parses arguments, resolves settings and dispatches to the command modules.

mod check;
mod company;
mod errors;
mod export;
mod helpers;
mod init;
mod mine;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::config::{load_settings_with_options, LoadOptions, Settings};

#[derive(Parser)]
#[command(name = "assay")]
#[command(about = "Mine gold and silver resource estimates from company reports")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Data directory (overrides config file)
    #[arg(long, short = 'd', global = true, env = "ASSAYER_DATA")]
    data: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Manage the company registry
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Crawl company websites and mine their reports
    Run {
        /// Tickers to process (all registered companies if omitted)
        tickers: Vec<String>,
        /// Companies crawled concurrently per batch
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Extract and mine a local PDF without crawling
    Mine {
        /// PDF file to mine
        file: PathBuf,
        /// Company description used to cross-check metals
        #[arg(short = 'D', long, default_value = "")]
        description: String,
    },

    /// Inspect the error ledger
    Errors {
        #[command(subcommand)]
        command: ErrorCommands,
    },

    /// Export stored estimates as JSON
    Export {
        /// Output file (stdout if omitted)
        output: Option<PathBuf>,
    },

    /// Check if required extraction tools are installed
    Check,
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Register a company, or update an existing ticker
    Add {
        ticker: String,
        /// Company website used as the crawl seed
        #[arg(short, long)]
        website: Option<String>,
        /// Market capitalization
        #[arg(short, long)]
        market_cap: Option<f64>,
        /// Market capitalization currency
        #[arg(long)]
        currency: Option<String>,
        /// Free-text description (metals mentioned here are cross-checked)
        #[arg(short = 'D', long)]
        description: Option<String>,
    },
    /// List registered companies
    List,
    /// Remove a company and its stored estimates
    Remove { ticker: String },
}

#[derive(Subcommand)]
enum ErrorCommands {
    /// List ledger entries
    List {
        /// Only show entries for this ticker
        ticker: Option<String>,
        /// Include resolved entries
        #[arg(short, long)]
        all: bool,
    },
    /// Mark ledger entries resolved
    Resolve {
        /// Only resolve entries for this ticker
        ticker: Option<String>,
    },
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

impl Cli {
    /// Resolve settings from the config file and global flags.
    pub async fn load_settings(&self) -> Settings {
        let options = LoadOptions {
            config_path: self.config.clone(),
            use_cwd: self.cwd,
            data: self.data.clone(),
        };
        let (settings, _config) = load_settings_with_options(options).await;
        settings
    }
}

/// Run the parsed command.
pub async fn run(cli: Cli, settings: Settings, cancel: CancellationToken) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Company { command } => match command {
            CompanyCommands::Add {
                ticker,
                website,
                market_cap,
                currency,
                description,
            } => {
                company::cmd_company_add(
                    &settings,
                    &ticker,
                    website,
                    market_cap,
                    currency,
                    description,
                )
                .await
            }
            CompanyCommands::List => company::cmd_company_list(&settings).await,
            CompanyCommands::Remove { ticker } => {
                company::cmd_company_remove(&settings, &ticker).await
            }
        },
        Commands::Run {
            tickers,
            batch_size,
        } => run::cmd_run(&settings, &tickers, batch_size, cancel).await,
        Commands::Mine { file, description } => {
            mine::cmd_mine(&settings, &file, &description).await
        }
        Commands::Errors { command } => match command {
            ErrorCommands::List { ticker, all } => {
                errors::cmd_errors_list(&settings, ticker.as_deref(), all).await
            }
            ErrorCommands::Resolve { ticker } => {
                errors::cmd_errors_resolve(&settings, ticker.as_deref()).await
            }
        },
        Commands::Export { output } => export::cmd_export(&settings, output.as_deref()).await,
        Commands::Check => check::cmd_check().await,
    }
}
