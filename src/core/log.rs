//! Diagnostic output for the CLI.
//!
//! Everything goes to stderr so `show --format json` stays parseable on stdout.

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::{Directive, Targets};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const APP_TARGET: &str = "cryptodash";
const HTTP_TARGETS: [&str; 2] = ["reqwest", "hyper_util"];

fn app_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    }
}

/// Our own events at `level`; the HTTP stack only for warnings and errors.
fn app_targets(level: LevelFilter) -> Targets {
    HTTP_TARGETS.iter().fold(
        Targets::new().with_target(APP_TARGET, level),
        |targets, target| targets.with_target(*target, level.min(LevelFilter::WARN)),
    )
}

/// Installs the global subscriber. `RUST_LOG` narrows or widens output further.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = app_level(verbose);
    let env_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(level))
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(app_targets(level))
        .with(env_filter)
        .try_init()
        .context("Failed to install the log subscriber")
}
