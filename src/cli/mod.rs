//! Terminal front end: argument resolution and rendering of dashboard views.

pub mod dashboard;
pub mod export;
pub mod setup;
pub mod symbols;
pub mod ui;

use crate::core::config::AppConfig;
use crate::core::{CurrencyUnit, FetchError, Session, Snapshot, SnapshotProvider, Timeframe, ViewState};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::{debug, error};

/// Dashboard inputs as given on the command line. Unset fields fall back to config.
#[derive(Debug, Clone, Default)]
pub struct SelectionArgs {
    pub currency: Option<CurrencyUnit>,
    /// Symbols to select; `None` selects every coin in the snapshot.
    pub coins: Option<Vec<String>>,
    pub top: Option<usize>,
    pub timeframe: Option<Timeframe>,
    pub sort: Option<bool>,
}

impl SelectionArgs {
    pub fn view_state(&self, snapshot: &Snapshot, config: &AppConfig) -> Result<ViewState> {
        let top = self.top.unwrap_or(config.view.top);
        let timeframe = self.timeframe.unwrap_or(config.view.timeframe);
        let sort = self.sort.unwrap_or(config.view.sort);

        match &self.coins {
            Some(coins) => {
                // Exact symbol first, then case-insensitive, since symbols such as stETH are
                // mixed case and two listings may differ only by case.
                let records = snapshot.records();
                let coins = coins.iter().map(|c| {
                    let c = c.trim();
                    records
                        .iter()
                        .find(|r| r.symbol == c)
                        .or_else(|| records.iter().find(|r| r.symbol.eq_ignore_ascii_case(c)))
                        .map_or_else(|| c.to_string(), |r| r.symbol.clone())
                });
                ViewState::new(coins, top, timeframe, sort)
            }
            None => ViewState::select_all(snapshot, top, timeframe, sort),
        }
    }
}

/// Refreshes the session with a spinner and turns fetch failures into user-facing errors.
pub async fn fetch_snapshot<P: SnapshotProvider>(
    session: &Session<P>,
    currency: CurrencyUnit,
) -> Result<Arc<Snapshot>> {
    let pb = ui::new_spinner(&format!("Fetching top 100 listings in {currency}..."));
    let result = session.refresh(currency).await;
    pb.finish_and_clear();

    match result {
        Ok(Some(snapshot)) => {
            debug!(count = snapshot.len(), "Snapshot ready");
            Ok(snapshot)
        }
        // A newer refresh won; show its snapshot when it is for the same unit.
        Ok(None) => match session.current() {
            Some(snapshot) if snapshot.currency() == currency => Ok(snapshot),
            _ => bail!("Request for {} listings was superseded", currency),
        },
        Err(e @ FetchError::Auth { .. }) => {
            error!(kind = ?e.kind(), "CoinMarketCap rejected the request");
            Err(e).context("Check the CoinMarketCap API key")
        }
        Err(e) => {
            error!(kind = ?e.kind(), error = %e, "Failed to load listings");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coin::tests::coin;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// The first load is slow, so any later one overtakes it.
    struct SlowFirstProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotProvider for SlowFirstProvider {
        async fn load(&self, currency: CurrencyUnit) -> Result<Arc<Snapshot>, FetchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(Arc::new(Snapshot::new(
                currency,
                Utc::now(),
                vec![coin("BTC", 1.0, 1.0)],
            )))
        }
    }

    fn slow_first_session() -> Session<SlowFirstProvider> {
        Session::new(SlowFirstProvider {
            calls: AtomicUsize::new(0),
        })
    }

    fn config() -> AppConfig {
        serde_yaml::from_str("currency: USD\nview:\n  top: 2\n  timeframe: 1h\n  sort: false").unwrap()
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(
            CurrencyUnit::Usd,
            Utc::now(),
            vec![coin("BTC", 3.0, 1.0), coin("ETH", 2.0, 1.0), coin("SOL", 1.0, 1.0)],
        )
    }

    #[test]
    fn test_view_state_falls_back_to_config() {
        let state = SelectionArgs::default()
            .view_state(&snapshot(), &config())
            .unwrap();

        assert_eq!(state.display_count(), 2);
        assert_eq!(state.timeframe(), Timeframe::OneHour);
        assert!(!state.sort_ascending());
        assert_eq!(state.selected_symbols().len(), 3);
    }

    #[test]
    fn test_view_state_uses_arguments() {
        let args = SelectionArgs {
            currency: None,
            coins: Some(vec![" eth".to_string(), "sol ".to_string()]),
            top: Some(10),
            timeframe: Some(Timeframe::SevenDays),
            sort: Some(true),
        };

        let state = args.view_state(&snapshot(), &config()).unwrap();

        assert_eq!(state.display_count(), 10);
        assert_eq!(state.timeframe(), Timeframe::SevenDays);
        assert!(state.sort_ascending());
        let selected: Vec<&str> = state.selected_symbols().iter().map(String::as_str).collect();
        assert_eq!(selected, vec!["ETH", "SOL"]);
    }

    #[test]
    fn test_view_state_prefers_exact_symbol_over_case_match() {
        let snapshot = Snapshot::new(
            CurrencyUnit::Usd,
            Utc::now(),
            vec![coin("steth", 2.0, 1.0), coin("STETH", 1.0, 1.0)],
        );
        let select = |coin: &str| {
            let args = SelectionArgs {
                coins: Some(vec![coin.to_string()]),
                ..Default::default()
            };
            let state = args.view_state(&snapshot, &config()).unwrap();
            state.selected_symbols().iter().cloned().collect::<Vec<_>>()
        };

        assert_eq!(select("STETH"), vec!["STETH"]);
        assert_eq!(select("steth"), vec!["steth"]);
        // No exact match falls back to the first case-insensitive one.
        assert_eq!(select("StEth"), vec!["steth"]);
    }

    #[test]
    fn test_view_state_rejects_bad_top() {
        let args = SelectionArgs {
            top: Some(0),
            ..Default::default()
        };
        assert!(args.view_state(&snapshot(), &config()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_uses_newer_snapshot_of_same_unit() {
        let session = slow_first_session();

        let (stale, fresh) = tokio::join!(
            fetch_snapshot(&session, CurrencyUnit::Usd),
            fetch_snapshot(&session, CurrencyUnit::Usd)
        );

        let (stale, fresh) = (stale.unwrap(), fresh.unwrap());
        assert!(Arc::ptr_eq(&stale, &fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_for_other_unit_fails() {
        let session = slow_first_session();

        let (stale, fresh) = tokio::join!(
            fetch_snapshot(&session, CurrencyUnit::Usd),
            fetch_snapshot(&session, CurrencyUnit::Btc)
        );

        assert!(stale.unwrap_err().to_string().contains("superseded"));
        assert_eq!(fresh.unwrap().currency(), CurrencyUnit::Btc);
    }
}
