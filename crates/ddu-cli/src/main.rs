//! # ddu-cli
//!
//! Command-line front end for ddu.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ddu_core::error::format_error_with_suggestion;
use ddu_core::Config;

mod commands;
mod host;

/// ddu - streaming item picker
#[derive(Parser)]
#[command(name = "ddu")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pick from the lines of a file and print the result
    Pick(PickArgs),
    /// Print the default options
    Defaults,
    /// Show the loaded configuration and its validation issues
    Config,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PickArgs {
    /// File to read items from
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Query string
    #[arg(short, long, default_value = "")]
    pub input: String,

    /// Matcher to apply (repeatable)
    #[arg(short, long = "matcher", value_name = "NAME")]
    pub matchers: Vec<String>,

    /// Sorter to apply (repeatable)
    #[arg(short, long = "sorter", value_name = "NAME")]
    pub sorters: Vec<String>,

    /// Print items as JSON instead of buffer lines
    #[arg(long)]
    pub json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration before logging so its level can apply
    let loaded = Config::load_validated();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = &loaded {
        tracing::warn!("Failed to load config, using defaults: {}", e);
    }

    if let Err(e) = run(cli, config).await {
        match e.downcast_ref::<ddu_core::Error>() {
            Some(err) => eprintln!("Error: {}", format_error_with_suggestion(err)),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Pick(args) => commands::pick::run(&args, &config).await,
        Commands::Defaults => commands::defaults::run(&config),
        Commands::Config => commands::config::run(),
    }
}
