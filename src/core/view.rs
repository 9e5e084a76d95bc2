//! Derives the tables and chart series shown by the dashboard.
//!
//! Everything here is a pure function of a [`Snapshot`] and a [`ViewState`]:
//! the results borrow from the snapshot and are rebuilt on every input change.

use crate::core::coin::{CoinRecord, Snapshot};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

/// Largest number of rows the provider returns and the dashboard can show.
pub const MAX_DISPLAY_COUNT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    TwentyFourHours,
    #[serde(rename = "7d")]
    SevenDays,
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Timeframe::OneHour => "1h",
                Timeframe::TwentyFourHours => "24h",
                Timeframe::SevenDays => "7d",
            }
        )
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1h" => Ok(Timeframe::OneHour),
            "24h" => Ok(Timeframe::TwentyFourHours),
            "7d" => Ok(Timeframe::SevenDays),
            _ => Err(anyhow::anyhow!("Invalid timeframe: {}", s)),
        }
    }
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [
        Timeframe::OneHour,
        Timeframe::TwentyFourHours,
        Timeframe::SevenDays,
    ];

    /// Name of the percent-change column this timeframe selects.
    pub fn column(&self) -> &'static str {
        match self {
            Timeframe::OneHour => "percent_change_1h",
            Timeframe::TwentyFourHours => "percent_change_24h",
            Timeframe::SevenDays => "percent_change_7d",
        }
    }

    pub fn bar_chart_title(&self) -> &'static str {
        match self {
            Timeframe::OneHour => "% Price Change over 1 hour",
            Timeframe::TwentyFourHours => "% Price Change over 24 hours",
            Timeframe::SevenDays => "% Price Change over 7 days",
        }
    }

    pub fn percent_change(&self, record: &CoinRecord) -> f64 {
        match self {
            Timeframe::OneHour => record.percent_change_1h,
            Timeframe::TwentyFourHours => record.percent_change_24h,
            Timeframe::SevenDays => record.percent_change_7d,
        }
    }
}

/// User inputs that shape the derived views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    selected_symbols: BTreeSet<String>,
    display_count: usize,
    timeframe: Timeframe,
    sort_ascending: bool,
}

impl ViewState {
    pub fn new(
        selected_symbols: impl IntoIterator<Item = impl Into<String>>,
        display_count: usize,
        timeframe: Timeframe,
        sort_ascending: bool,
    ) -> Result<Self> {
        if !(1..=MAX_DISPLAY_COUNT).contains(&display_count) {
            bail!(
                "Display count must be between 1 and {}, got {}",
                MAX_DISPLAY_COUNT,
                display_count
            );
        }
        Ok(Self {
            selected_symbols: selected_symbols.into_iter().map(Into::into).collect(),
            display_count,
            timeframe,
            sort_ascending,
        })
    }

    /// Selects every coin in the snapshot, the dashboard's initial selection.
    pub fn select_all(
        snapshot: &Snapshot,
        display_count: usize,
        timeframe: Timeframe,
        sort_ascending: bool,
    ) -> Result<Self> {
        Self::new(
            snapshot.sorted_symbols(),
            display_count,
            timeframe,
            sort_ascending,
        )
    }

    pub fn selected_symbols(&self) -> &BTreeSet<String> {
        &self.selected_symbols
    }

    pub fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn sort_ascending(&self) -> bool {
        self.sort_ascending
    }
}

/// Percent changes of one coin with their sign classification.
///
/// A change is positive only when strictly greater than zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRow<'a> {
    pub symbol: &'a str,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub positive_1h: bool,
    pub positive_24h: bool,
    pub positive_7d: bool,
}

impl ChangeRow<'_> {
    pub fn change(&self, timeframe: Timeframe) -> f64 {
        match timeframe {
            Timeframe::OneHour => self.percent_change_1h,
            Timeframe::TwentyFourHours => self.percent_change_24h,
            Timeframe::SevenDays => self.percent_change_7d,
        }
    }

    pub fn is_positive(&self, timeframe: Timeframe) -> bool {
        match timeframe {
            Timeframe::OneHour => self.positive_1h,
            Timeframe::TwentyFourHours => self.positive_24h,
            Timeframe::SevenDays => self.positive_7d,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPoint<'a> {
    pub symbol: &'a str,
    pub value: f64,
    pub positive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart<'a> {
    pub title: &'static str,
    pub timeframe: Timeframe,
    pub points: Vec<BarPoint<'a>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice<'a> {
    pub symbol: &'a str,
    pub market_cap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart<'a> {
    pub title: &'static str,
    pub slices: Vec<PieSlice<'a>>,
}

impl PieChart<'_> {
    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.market_cap).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint<'a> {
    pub symbol: &'a str,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart<'a> {
    pub title: &'static str,
    pub points: Vec<LinePoint<'a>>,
}

/// All views the dashboard renders for one snapshot and view state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView<'a> {
    /// Selection-filtered rows, untruncated. This is what gets exported.
    pub selected: Vec<&'a CoinRecord>,
    /// First `display_count` rows of `selected`.
    pub displayed: Vec<&'a CoinRecord>,
    pub changes: Vec<ChangeRow<'a>>,
    pub bar: BarChart<'a>,
    pub pie: PieChart<'a>,
    pub line: LineChart<'a>,
}

impl DashboardView<'_> {
    /// Rows and columns of the selected table.
    pub fn dimension(&self) -> (usize, usize) {
        (self.selected.len(), CoinRecord::COLUMNS.len())
    }
}

pub fn filter_selected<'a>(
    records: &'a [CoinRecord],
    selected: &BTreeSet<String>,
) -> Vec<&'a CoinRecord> {
    records
        .iter()
        .filter(|r| selected.contains(&r.symbol))
        .collect()
}

pub fn truncate<'a>(filtered: &[&'a CoinRecord], count: usize) -> Vec<&'a CoinRecord> {
    filtered.iter().take(count).copied().collect()
}

pub fn annotate_changes<'a>(records: &[&'a CoinRecord]) -> Vec<ChangeRow<'a>> {
    records
        .iter()
        .map(|&r| ChangeRow {
            symbol: &r.symbol,
            percent_change_1h: r.percent_change_1h,
            percent_change_24h: r.percent_change_24h,
            percent_change_7d: r.percent_change_7d,
            positive_1h: r.percent_change_1h > 0.0,
            positive_24h: r.percent_change_24h > 0.0,
            positive_7d: r.percent_change_7d > 0.0,
        })
        .collect()
}

pub fn bar_chart<'a>(
    records: &[&'a CoinRecord],
    timeframe: Timeframe,
    sort_ascending: bool,
) -> BarChart<'a> {
    let mut points: Vec<BarPoint<'a>> = records
        .iter()
        .map(|&r| {
            let value = timeframe.percent_change(r);
            BarPoint {
                symbol: &r.symbol,
                value,
                positive: value > 0.0,
            }
        })
        .collect();

    // Stable, so equal values keep their truncation order.
    if sort_ascending {
        points.sort_by(|a, b| a.value.total_cmp(&b.value));
    }

    BarChart {
        title: timeframe.bar_chart_title(),
        timeframe,
        points,
    }
}

pub fn pie_chart<'a>(records: &[&'a CoinRecord]) -> PieChart<'a> {
    PieChart {
        title: "Market Cap Distribution of Selected Coins",
        slices: records
            .iter()
            .map(|&r| PieSlice {
                symbol: &r.symbol,
                market_cap: r.market_cap,
            })
            .collect(),
    }
}

pub fn line_chart<'a>(records: &[&'a CoinRecord]) -> LineChart<'a> {
    LineChart {
        title: "Price Trends of Selected Coins",
        points: records
            .iter()
            .map(|&r| LinePoint {
                symbol: &r.symbol,
                price: r.price,
            })
            .collect(),
    }
}

/// Builds every dashboard view from a snapshot.
///
/// Filtering keeps snapshot order, truncation takes a prefix of the filtered
/// rows, and only the bar chart honours the sort toggle.
pub fn derive<'a>(snapshot: &'a Snapshot, state: &ViewState) -> DashboardView<'a> {
    let selected = filter_selected(snapshot.records(), &state.selected_symbols);
    let displayed = truncate(&selected, state.display_count);

    DashboardView {
        changes: annotate_changes(&displayed),
        bar: bar_chart(&displayed, state.timeframe, state.sort_ascending),
        pie: pie_chart(&displayed),
        line: line_chart(&displayed),
        selected,
        displayed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coin::CurrencyUnit;
    use crate::core::coin::tests::coin;
    use chrono::{TimeZone, Utc};

    fn scenario_snapshot() -> Snapshot {
        Snapshot::new(
            CurrencyUnit::Usd,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            vec![
                coin("BTC", 100.0, 2.0),
                coin("ETH", 50.0, -1.0),
                coin("DOGE", 10.0, 0.0),
                coin("ADA", 5.0, 5.0),
                coin("SOL", 3.0, -3.0),
            ],
        )
    }

    fn symbols<'a>(records: &[&'a CoinRecord]) -> Vec<&'a str> {
        records.iter().map(|r| r.symbol.as_str()).collect()
    }

    #[test]
    fn test_timeframe_parsing_and_columns() {
        assert_eq!("24H".parse::<Timeframe>().unwrap(), Timeframe::TwentyFourHours);
        assert_eq!("7d".parse::<Timeframe>().unwrap(), Timeframe::SevenDays);
        assert!("30d".parse::<Timeframe>().is_err());
        for tf in Timeframe::ALL {
            assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), tf);
            assert!(tf.column().ends_with(&tf.to_string()));
        }
    }

    #[test]
    fn test_view_state_rejects_out_of_range_count() {
        assert!(ViewState::new(["BTC"], 0, Timeframe::OneHour, false).is_err());
        assert!(ViewState::new(["BTC"], 101, Timeframe::OneHour, false).is_err());
        assert!(ViewState::new(["BTC"], 1, Timeframe::OneHour, false).is_ok());
        assert!(ViewState::new(["BTC"], 100, Timeframe::OneHour, false).is_ok());
    }

    #[test]
    fn test_scenario_sorted_bar_chart() {
        let snapshot = scenario_snapshot();
        let state = ViewState::new(
            ["BTC", "ETH", "DOGE", "ADA", "SOL"],
            3,
            Timeframe::TwentyFourHours,
            true,
        )
        .unwrap();

        let view = derive(&snapshot, &state);

        assert_eq!(symbols(&view.selected), vec!["BTC", "ETH", "DOGE", "ADA", "SOL"]);
        assert_eq!(symbols(&view.displayed), vec!["BTC", "ETH", "DOGE"]);

        let bar: Vec<(&str, f64)> = view.bar.points.iter().map(|p| (p.symbol, p.value)).collect();
        assert_eq!(bar, vec![("ETH", -1.0), ("DOGE", 0.0), ("BTC", 2.0)]);
        assert_eq!(view.bar.title, "% Price Change over 24 hours");

        let positive: Vec<(&str, bool)> =
            view.changes.iter().map(|c| (c.symbol, c.positive_24h)).collect();
        assert_eq!(positive, vec![("BTC", true), ("ETH", false), ("DOGE", false)]);

        // Pie and line ignore the sort toggle.
        let pie: Vec<&str> = view.pie.slices.iter().map(|s| s.symbol).collect();
        let line: Vec<&str> = view.line.points.iter().map(|p| p.symbol).collect();
        assert_eq!(pie, vec!["BTC", "ETH", "DOGE"]);
        assert_eq!(line, vec!["BTC", "ETH", "DOGE"]);
        assert_eq!(view.pie.total(), 160.0);
    }

    #[test]
    fn test_unsorted_bar_chart_keeps_truncation_order() {
        let snapshot = scenario_snapshot();
        let state = ViewState::select_all(&snapshot, 100, Timeframe::TwentyFourHours, false).unwrap();

        let view = derive(&snapshot, &state);

        let bar: Vec<&str> = view.bar.points.iter().map(|p| p.symbol).collect();
        assert_eq!(bar, symbols(&view.displayed));
        assert_eq!(bar, vec!["BTC", "ETH", "DOGE", "ADA", "SOL"]);
    }

    #[test]
    fn test_sorted_bar_chart_is_non_decreasing() {
        let snapshot = scenario_snapshot();
        for tf in Timeframe::ALL {
            let state = ViewState::select_all(&snapshot, 100, tf, true).unwrap();
            let view = derive(&snapshot, &state);
            assert_eq!(view.bar.timeframe, tf);
            assert!(view.bar.points.windows(2).all(|w| w[0].value <= w[1].value));
        }
    }

    #[test]
    fn test_selection_filter_keeps_snapshot_order() {
        let snapshot = scenario_snapshot();
        // Selection order and unknown symbols must not matter.
        let state = ViewState::new(["SOL", "XRP", "BTC", "ADA"], 100, Timeframe::SevenDays, false)
            .unwrap();

        let view = derive(&snapshot, &state);

        assert_eq!(symbols(&view.selected), vec!["BTC", "ADA", "SOL"]);
        assert!(
            view.selected
                .iter()
                .all(|r| state.selected_symbols().contains(&r.symbol))
        );
    }

    #[test]
    fn test_truncation_is_prefix_of_selection() {
        let snapshot = scenario_snapshot();
        for n in 1..=7 {
            let state = ViewState::new(["ETH", "DOGE", "SOL"], n, Timeframe::OneHour, true).unwrap();
            let view = derive(&snapshot, &state);
            assert_eq!(view.displayed.len(), n.min(view.selected.len()));
            assert_eq!(view.displayed[..], view.selected[..view.displayed.len()]);
            assert_eq!(view.changes.len(), view.displayed.len());
        }
    }

    #[test]
    fn test_sign_annotation_is_strict() {
        let mut flat = coin("USDT", 80.0, 0.0);
        flat.percent_change_1h = 0.0;
        flat.percent_change_7d = -0.0;
        let mut tiny = coin("XRP", 20.0, 1e-9);
        tiny.percent_change_1h = -1e-9;

        let rows = annotate_changes(&[&flat, &tiny]);

        assert!(!rows[0].positive_1h);
        assert!(!rows[0].positive_24h);
        assert!(!rows[0].positive_7d);
        assert!(!rows[1].positive_1h);
        assert!(rows[1].positive_24h);
        assert!(rows[1].is_positive(Timeframe::TwentyFourHours));
        for row in &rows {
            assert_eq!(row.positive_1h, row.percent_change_1h > 0.0);
            assert_eq!(row.positive_24h, row.percent_change_24h > 0.0);
            assert_eq!(row.positive_7d, row.percent_change_7d > 0.0);
        }
    }

    #[test]
    fn test_empty_selection_yields_empty_views() {
        let snapshot = scenario_snapshot();
        let state = ViewState::new(Vec::<String>::new(), 10, Timeframe::SevenDays, true).unwrap();

        let view = derive(&snapshot, &state);

        assert!(view.selected.is_empty());
        assert!(view.displayed.is_empty());
        assert!(view.changes.is_empty());
        assert!(view.bar.points.is_empty());
        assert!(view.pie.slices.is_empty());
        assert!(view.line.points.is_empty());
        assert_eq!(view.dimension(), (0, 8));
        assert_eq!(view.bar.title, "% Price Change over 7 days");
    }

    #[test]
    fn test_derive_is_deterministic() {
        let snapshot = scenario_snapshot();
        let state = ViewState::new(["ADA", "ETH", "BTC"], 2, Timeframe::OneHour, true).unwrap();

        let first = serde_json::to_string(&derive(&snapshot, &state)).unwrap();
        let second = serde_json::to_string(&derive(&snapshot, &state)).unwrap();

        assert_eq!(first, second);
        assert_eq!(derive(&snapshot, &state), derive(&snapshot, &state));
    }

    #[test]
    fn test_derive_does_not_touch_snapshot() {
        let snapshot = scenario_snapshot();
        let before = snapshot.clone();
        let state = ViewState::select_all(&snapshot, 2, Timeframe::TwentyFourHours, true).unwrap();

        let _ = derive(&snapshot, &state);

        assert_eq!(snapshot, before);
    }
}
