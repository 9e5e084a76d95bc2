pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::SelectionArgs;
use crate::cli::dashboard::OutputFormat;
use crate::core::config::AppConfig;
use crate::core::{CurrencyUnit, Session};
use crate::providers::{CachingSnapshotProvider, CoinMarketCapProvider};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    Show {
        selection: SelectionArgs,
        format: OutputFormat,
    },
    Export {
        selection: SelectionArgs,
        output: PathBuf,
    },
    Symbols {
        currency: Option<CurrencyUnit>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("cryptodash starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = CoinMarketCapProvider::new(
        &config.providers.coinmarketcap.base_url,
        &config.api_key()?,
        config.request_timeout(),
    )?;
    let session = Session::new(CachingSnapshotProvider::new(provider, config.cache_ttl()));

    match command {
        AppCommand::Show { selection, format } => {
            cli::dashboard::run(&session, &config, &selection, format).await
        }
        AppCommand::Export { selection, output } => {
            cli::export::run(&session, &config, &selection, &output).await
        }
        AppCommand::Symbols { currency } => {
            cli::symbols::run(&session, currency.unwrap_or(config.currency)).await
        }
    }
}
