use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::coin::{CoinRecord, CurrencyUnit, Snapshot};
use crate::core::fetch::{FetchError, SnapshotProvider};

pub const DEFAULT_BASE_URL: &str = "https://pro-api.coinmarketcap.com";
const LISTINGS_ENDPOINT: &str = "/v1/cryptocurrency/listings/latest";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";
const LISTING_START: &str = "1";
const LISTING_LIMIT: &str = "100";

/// Fetches the latest top 100 listings from the CoinMarketCap pro API.
pub struct CoinMarketCapProvider {
    listings_url: Url,
    api_key: String,
    timeout: Duration,
}

impl CoinMarketCapProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let listings_url = Url::parse(&format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            LISTINGS_ENDPOINT
        ))
        .with_context(|| format!("Invalid CoinMarketCap base URL: {base_url}"))?;

        Ok(CoinMarketCapProvider {
            listings_url,
            api_key: api_key.to_string(),
            timeout,
        })
    }

    fn listings_url(&self, currency: CurrencyUnit) -> Url {
        let mut url = self.listings_url.clone();
        url.query_pairs_mut()
            .append_pair("start", LISTING_START)
            .append_pair("limit", LISTING_LIMIT)
            .append_pair("convert", currency.as_str());
        url
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    status: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    error_message: Option<String>,
}

#[async_trait]
impl SnapshotProvider for CoinMarketCapProvider {
    #[instrument(name = "CoinMarketCapListings", skip(self), fields(currency = %currency))]
    async fn load(&self, currency: CurrencyUnit) -> Result<Arc<Snapshot>, FetchError> {
        let url = self.listings_url(currency);
        debug!("Requesting listings from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("cryptodash/0.1")
            .timeout(self.timeout)
            .build()?;
        let response = client
            .get(url)
            .header("Accepts", "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "Received CoinMarketCap response");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|e| e.status.error_message)
                .unwrap_or_else(|| status.to_string());
            return Err(FetchError::Auth {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            debug!("Failed to parse listings response: {}", e);
            FetchError::schema("body")
        })?;
        let records = parse_listings(&body, currency)?;
        debug!(count = records.len(), "Parsed listings");

        Ok(Arc::new(Snapshot::new(currency, Utc::now(), records)))
    }
}

/// Maps the listings payload to records, failing on the first malformed entry.
fn parse_listings(body: &Value, currency: CurrencyUnit) -> Result<Vec<CoinRecord>, FetchError> {
    let entries = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::schema("data"))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry, currency))
        .collect()
}

fn parse_entry(index: usize, entry: &Value, currency: CurrencyUnit) -> Result<CoinRecord, FetchError> {
    let unit = currency.as_str();
    let symbol = entry.get("symbol").and_then(Value::as_str);
    let invalid = |field: String| FetchError::Schema {
        index: Some(index),
        symbol: symbol.map(str::to_string),
        field,
    };

    let symbol = symbol.ok_or_else(|| invalid("symbol".to_string()))?;
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("name".to_string()))?;
    let quote = entry
        .get("quote")
        .and_then(|q| q.get(unit))
        .ok_or_else(|| invalid(format!("quote.{unit}")))?;
    let number = |field: &str| {
        quote
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| invalid(format!("quote.{unit}.{field}")))
    };

    Ok(CoinRecord {
        name: name.to_string(),
        symbol: symbol.to_string(),
        price: number("price")?,
        percent_change_1h: number("percent_change_1h")?,
        percent_change_24h: number("percent_change_24h")?,
        percent_change_7d: number("percent_change_7d")?,
        market_cap: number("market_cap")?,
        volume_24h: number("volume_24h")?,
    })
}
