use super::{SelectionArgs, fetch_snapshot, ui};
use crate::core::config::AppConfig;
use crate::core::export::{self, DEFAULT_FILE_NAME};
use crate::core::view::{self, BarChart, ChangeRow, DashboardView, LineChart, PieChart};
use crate::core::{CoinRecord, CurrencyUnit, Session, Snapshot, SnapshotProvider, Timeframe};
use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::Cell;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid output format: {}", s)),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
struct JsonDashboard<'a> {
    currency: CurrencyUnit,
    fetched_at: DateTime<Utc>,
    #[serde(flatten)]
    view: &'a DashboardView<'a>,
    csv_file_name: &'static str,
    csv_data_uri: String,
}

pub async fn run<P: SnapshotProvider>(
    session: &Session<P>,
    config: &AppConfig,
    selection: &SelectionArgs,
    format: OutputFormat,
) -> Result<()> {
    let currency = selection.currency.unwrap_or(config.currency);
    let snapshot = fetch_snapshot(session, currency).await?;
    let state = selection.view_state(&snapshot, config)?;
    let view = view::derive(&snapshot, &state);

    match format {
        OutputFormat::Table => println!("{}", render(&snapshot, &view)),
        OutputFormat::Json => println!("{}", render_json(&snapshot, &view)?),
    }
    Ok(())
}

pub fn render_json(snapshot: &Snapshot, view: &DashboardView<'_>) -> Result<String> {
    let csv = export::to_csv(view.selected.iter().copied())?;
    let dashboard = JsonDashboard {
        currency: snapshot.currency(),
        fetched_at: snapshot.fetched_at(),
        view,
        csv_file_name: DEFAULT_FILE_NAME,
        csv_data_uri: export::csv_data_uri(&csv),
    };
    Ok(serde_json::to_string_pretty(&dashboard)?)
}

/// Renders every dashboard section as terminal text.
pub fn render(snapshot: &Snapshot, view: &DashboardView<'_>) -> String {
    let currency = snapshot.currency();
    let (rows, columns) = view.dimension();

    let mut output = format!(
        "{}\n{}\n",
        ui::style_text(
            &format!("Price Data of Selected Cryptocurrency ({currency})"),
            ui::StyleType::Title
        ),
        ui::style_text(
            &format!(
                "Fetched at {}",
                snapshot.fetched_at().format("%Y-%m-%d %H:%M:%S UTC")
            ),
            ui::StyleType::Subtle
        )
    );
    output.push_str(&format!(
        "Data Dimension: {rows} rows and {columns} columns.\n"
    ));
    output.push_str(&coins_table(&view.displayed, currency));
    output.push_str(&format!(
        "\n{}\n",
        ui::style_text(
            &format!("Run `cryptodash export` to download the selection as {DEFAULT_FILE_NAME}"),
            ui::StyleType::Subtle
        )
    ));

    output.push_str(&format!(
        "\n{}\n",
        ui::style_text("Table of % Price Change", ui::StyleType::Title)
    ));
    output.push_str(&changes_table(&view.changes));
    output.push('\n');

    output.push_str(&bar_chart(&view.bar));
    output.push_str(&pie_chart(&view.pie));
    output.push_str(&line_chart(&view.line, currency));
    output
}

fn coins_table(records: &[&CoinRecord], currency: CurrencyUnit) -> String {
    let precision = currency.price_precision();
    let mut table = ui::new_styled_table();
    table.set_header(CoinRecord::COLUMNS.iter().map(|c| ui::header_cell(c)));

    for record in records {
        table.add_row(vec![
            Cell::new(&record.name),
            Cell::new(&record.symbol),
            ui::number_cell(format!("{:.precision$}", record.price)),
            ui::number_cell(format!("{:.2}", record.percent_change_1h)),
            ui::number_cell(format!("{:.2}", record.percent_change_24h)),
            ui::number_cell(format!("{:.2}", record.percent_change_7d)),
            ui::number_cell(format!("{:.precision$}", record.market_cap)),
            ui::number_cell(format!("{:.precision$}", record.volume_24h)),
        ]);
    }
    table.to_string()
}

fn changes_table(rows: &[ChangeRow<'_>]) -> String {
    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("coin_symbol")];
    header.extend(Timeframe::ALL.iter().map(|tf| ui::header_cell(tf.column())));
    table.set_header(header);

    for row in rows {
        let mut cells = vec![Cell::new(row.symbol)];
        cells.extend(
            Timeframe::ALL
                .iter()
                .map(|&tf| ui::change_cell(row.change(tf), row.is_positive(tf))),
        );
        table.add_row(cells);
    }
    table.to_string()
}

fn symbol_width<'a>(symbols: impl Iterator<Item = &'a str>) -> usize {
    symbols.map(|s| s.chars().count()).max().unwrap_or(0)
}

fn bar_chart(chart: &BarChart<'_>) -> String {
    let mut output = format!("\n{}\n", ui::style_text(chart.title, ui::StyleType::Title));
    let width = symbol_width(chart.points.iter().map(|p| p.symbol));
    let scale = chart
        .points
        .iter()
        .map(|p| p.value.abs())
        .fold(0.0_f64, f64::max);

    for point in &chart.points {
        let fraction = if scale > 0.0 { point.value.abs() / scale } else { 0.0 };
        let bar = format!("{} {:.2}%", ui::bar(fraction), point.value);
        let style_type = if point.positive {
            ui::StyleType::Positive
        } else {
            ui::StyleType::Negative
        };
        output.push_str(&format!(
            "{:<width$} {}\n",
            point.symbol,
            ui::style_text(&bar, style_type)
        ));
    }
    output
}

fn pie_chart(chart: &PieChart<'_>) -> String {
    let mut output = format!("\n{}\n", ui::style_text(chart.title, ui::StyleType::Title));
    let width = symbol_width(chart.slices.iter().map(|s| s.symbol));
    let total = chart.total();

    for slice in &chart.slices {
        let share = if total > 0.0 { slice.market_cap / total } else { 0.0 };
        output.push_str(&format!(
            "{:<width$} {:>6.2}% {}\n",
            slice.symbol,
            share * 100.0,
            ui::bar(share)
        ));
    }
    output
}

fn line_chart(chart: &LineChart<'_>, currency: CurrencyUnit) -> String {
    let mut output = format!("\n{}\n", ui::style_text(chart.title, ui::StyleType::Title));
    let width = symbol_width(chart.points.iter().map(|p| p.symbol));
    let precision = currency.price_precision();
    let max_price = chart.points.iter().map(|p| p.price).fold(0.0_f64, f64::max);

    for point in &chart.points {
        let fraction = if max_price > 0.0 { point.price / max_price } else { 0.0 };
        output.push_str(&format!(
            "{:<width$} {} {:.precision$} {currency}\n",
            point.symbol,
            ui::bar(fraction),
            point.price
        ));
    }
    output
}
