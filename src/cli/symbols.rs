use super::{fetch_snapshot, ui};
use crate::core::{CurrencyUnit, Session, Snapshot, SnapshotProvider};
use anyhow::Result;

/// Lists the symbols available for `--coins`, alphabetically.
pub async fn run<P: SnapshotProvider>(session: &Session<P>, currency: CurrencyUnit) -> Result<()> {
    let snapshot = fetch_snapshot(session, currency).await?;
    println!("{}", render(&snapshot));
    Ok(())
}

fn render(snapshot: &Snapshot) -> String {
    let symbols = snapshot.sorted_symbols();
    format!(
        "{}\n{}",
        ui::style_text(
            &format!("{} cryptocurrencies", symbols.len()),
            ui::StyleType::Subtitle
        ),
        symbols.join(", ")
    )
}
