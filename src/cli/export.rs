use super::{SelectionArgs, fetch_snapshot, ui};
use crate::core::config::AppConfig;
use crate::core::export;
use crate::core::view;
use crate::core::{Session, SnapshotProvider};
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Writes the selection-filtered coins, untruncated, to a CSV file.
pub async fn run<P: SnapshotProvider>(
    session: &Session<P>,
    config: &AppConfig,
    selection: &SelectionArgs,
    output: &Path,
) -> Result<()> {
    let currency = selection.currency.unwrap_or(config.currency);
    let snapshot = fetch_snapshot(session, currency).await?;
    let state = selection.view_state(&snapshot, config)?;
    let selected = view::filter_selected(snapshot.records(), state.selected_symbols());

    let rows = export::write_csv(selected, output)?;
    info!(rows, path = %output.display(), "Exported selection");
    println!(
        "Wrote {} rows ({}) to {}",
        rows,
        currency,
        ui::style_text(&output.display().to_string(), ui::StyleType::Subtitle)
    );
    Ok(())
}
