pub mod chart;
pub mod cli;
pub mod core;
pub mod feed;
pub mod providers;

use crate::chart::RangeKey;
use crate::core::config::AppConfig;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    /// Stream the watchlist; runs until Ctrl-C when no duration is given.
    Watch {
        duration: Option<Duration>,
        offline: bool,
    },
    Chart {
        symbol: String,
        range: RangeKey,
        offline: bool,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("livefeed starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Watch { duration, offline } => {
            let oracle = providers::build_oracle(&config.providers, offline)?;
            cli::watch::run(&config, oracle, duration).await
        }
        AppCommand::Chart {
            symbol,
            range,
            offline,
        } => {
            let oracle = providers::build_oracle(&config.providers, offline)?;
            cli::chart::run(&config, oracle.as_ref(), &symbol, range).await
        }
    }
}
