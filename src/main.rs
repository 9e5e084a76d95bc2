use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use cryptodash::cli::SelectionArgs;
use cryptodash::cli::dashboard::OutputFormat;
use cryptodash::core::export::DEFAULT_FILE_NAME;
use cryptodash::core::log::init_logging;
use cryptodash::core::{CurrencyUnit, Timeframe};
use std::path::PathBuf;

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

#[derive(Args)]
struct Selection {
    /// Currency unit for prices: USD, BTC or ETH
    #[arg(long)]
    currency: Option<CurrencyUnit>,

    /// Comma separated symbols to include (default: all top 100)
    #[arg(long, value_delimiter = ',')]
    coins: Option<Vec<String>>,

    /// Number of coins to display (1-100)
    #[arg(short = 'n', long)]
    top: Option<usize>,

    /// Percent change timeframe for the bar chart: 1h, 24h or 7d
    #[arg(short, long)]
    timeframe: Option<Timeframe>,

    /// Keep the bar chart in rank order instead of sorting by change
    #[arg(long)]
    no_sort: bool,
}

impl From<Selection> for SelectionArgs {
    fn from(s: Selection) -> SelectionArgs {
        SelectionArgs {
            currency: s.currency,
            coins: s.coins,
            top: s.top,
            timeframe: s.timeframe,
            sort: s.no_sort.then_some(false),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display price tables and charts
    Show {
        #[command(flatten)]
        selection: Selection,

        /// Output format: table or json
        #[arg(short, long, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Export the selected coins to CSV
    Export {
        #[command(flatten)]
        selection: Selection,

        /// Destination file
        #[arg(short, long, default_value = DEFAULT_FILE_NAME)]
        output: PathBuf,
    },
    /// List the symbols available for selection
    Symbols {
        /// Currency unit for prices: USD, BTC or ETH
        #[arg(long)]
        currency: Option<CurrencyUnit>,
    },
}

impl From<Commands> for cryptodash::AppCommand {
    fn from(cmd: Commands) -> cryptodash::AppCommand {
        match cmd {
            Commands::Show { selection, format } => cryptodash::AppCommand::Show {
                selection: selection.into(),
                format,
            },
            Commands::Export { selection, output } => cryptodash::AppCommand::Export {
                selection: selection.into(),
                output,
            },
            Commands::Symbols { currency } => cryptodash::AppCommand::Symbols { currency },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => cryptodash::cli::setup::setup(),
        Some(cmd) => cryptodash::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
