//! Market snapshot types shared by the fetcher, the view builder and the renderers.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Currency used to quote every price in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyUnit {
    Usd,
    Btc,
    Eth,
}

impl CurrencyUnit {
    pub const ALL: [CurrencyUnit; 3] = [CurrencyUnit::Usd, CurrencyUnit::Btc, CurrencyUnit::Eth];

    /// Code used for the provider's `convert` parameter and `quote` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyUnit::Usd => "USD",
            CurrencyUnit::Btc => "BTC",
            CurrencyUnit::Eth => "ETH",
        }
    }

    /// Decimal places used when showing a price in this unit.
    pub fn price_precision(&self) -> usize {
        match self {
            CurrencyUnit::Usd => 2,
            CurrencyUnit::Btc | CurrencyUnit::Eth => 8,
        }
    }
}

impl Display for CurrencyUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CurrencyUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(CurrencyUnit::Usd),
            "BTC" => Ok(CurrencyUnit::Btc),
            "ETH" => Ok(CurrencyUnit::Eth),
            _ => {
                let expected: Vec<&str> = CurrencyUnit::ALL.iter().map(|u| u.as_str()).collect();
                Err(anyhow::anyhow!(
                    "Invalid currency unit: {} (expected one of {})",
                    s,
                    expected.join(", ")
                ))
            }
        }
    }
}

/// One coin quoted in a single currency unit.
///
/// Field order is the column order of the CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    #[serde(rename = "coin_name")]
    pub name: String,
    #[serde(rename = "coin_symbol")]
    pub symbol: String,
    pub price: f64,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
}

impl CoinRecord {
    /// Column names in export order.
    pub const COLUMNS: [&'static str; 8] = [
        "coin_name",
        "coin_symbol",
        "price",
        "percent_change_1h",
        "percent_change_24h",
        "percent_change_7d",
        "market_cap",
        "volume_24h",
    ];
}

/// Immutable result of one listings fetch.
///
/// Records keep the provider's order (rank by market cap). A refresh builds a
/// new snapshot; nothing mutates an existing one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    currency: CurrencyUnit,
    fetched_at: DateTime<Utc>,
    records: Vec<CoinRecord>,
}

impl Snapshot {
    pub fn new(currency: CurrencyUnit, fetched_at: DateTime<Utc>, records: Vec<CoinRecord>) -> Self {
        Self {
            currency,
            fetched_at,
            records,
        }
    }

    pub fn currency(&self) -> CurrencyUnit {
        self.currency
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn records(&self) -> &[CoinRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Symbols in alphabetical order, as offered for the coin multi-select.
    pub fn sorted_symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.records.iter().map(|r| r.symbol.as_str()).collect();
        symbols.sort_unstable();
        symbols
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn coin(symbol: &str, market_cap: f64, change_24h: f64) -> CoinRecord {
        CoinRecord {
            name: format!("{symbol} coin"),
            symbol: symbol.to_string(),
            price: market_cap / 10.0,
            percent_change_1h: change_24h / 2.0,
            percent_change_24h: change_24h,
            percent_change_7d: change_24h * 3.0,
            market_cap,
            volume_24h: market_cap / 4.0,
        }
    }

    #[test]
    fn test_currency_unit_parsing() {
        assert_eq!("usd".parse::<CurrencyUnit>().unwrap(), CurrencyUnit::Usd);
        assert_eq!("BTC".parse::<CurrencyUnit>().unwrap(), CurrencyUnit::Btc);
        assert_eq!("Eth".parse::<CurrencyUnit>().unwrap(), CurrencyUnit::Eth);
        let err = "EUR".parse::<CurrencyUnit>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid currency unit: EUR (expected one of USD, BTC, ETH)"
        );
    }

    #[test]
    fn test_currency_unit_display_matches_quote_key() {
        for unit in CurrencyUnit::ALL {
            assert_eq!(unit.to_string(), unit.as_str());
            assert_eq!(unit.to_string().parse::<CurrencyUnit>().unwrap(), unit);
        }
    }

    #[test]
    fn test_sorted_symbols_keeps_records_in_rank_order() {
        let snapshot = Snapshot::new(
            CurrencyUnit::Usd,
            Utc::now(),
            vec![coin("BTC", 100.0, 1.0), coin("ETH", 50.0, 1.0), coin("ADA", 5.0, 1.0)],
        );

        assert_eq!(snapshot.sorted_symbols(), vec!["ADA", "BTC", "ETH"]);
        let symbols: Vec<&str> = snapshot.records().iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "ETH", "ADA"]);
        assert_eq!(snapshot.len(), 3);
    }
}
