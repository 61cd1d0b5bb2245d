use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use livefeed::chart::RangeKey;
use livefeed::core::log::init_logging;
use std::time::Duration;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Stream live prices for the watchlist
    Watch {
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(short, long)]
        duration_secs: Option<u64>,
        /// Simulate every symbol, never calling the price oracle
        #[arg(long)]
        offline: bool,
    },
    /// Display a price chart and range statistics for a symbol
    Chart {
        symbol: String,
        /// One of 1D, 1W, 1M, 3M, YTD, 1Y, ALL
        #[arg(short, long, default_value = "1M")]
        range: RangeKey,
        /// Use the configured price instead of asking the price oracle
        #[arg(long)]
        offline: bool,
    },
}

impl From<Commands> for livefeed::AppCommand {
    fn from(cmd: Commands) -> livefeed::AppCommand {
        match cmd {
            Commands::Watch {
                duration_secs,
                offline,
            } => livefeed::AppCommand::Watch {
                duration: duration_secs.map(Duration::from_secs),
                offline,
            },
            Commands::Chart {
                symbol,
                range,
                offline,
            } => livefeed::AppCommand::Chart {
                symbol,
                range,
                offline,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => livefeed::cli::setup::setup(),
        Some(cmd) => livefeed::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
