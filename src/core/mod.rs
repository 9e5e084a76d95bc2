//! Core market-data model and the pure view pipeline

pub mod cache;
pub mod coin;
pub mod config;
pub mod export;
pub mod fetch;
pub mod log;
pub mod session;
pub mod view;

// Re-export main types for cleaner imports
pub use coin::{CoinRecord, CurrencyUnit, Snapshot};
pub use fetch::{FetchError, FetchErrorKind, SnapshotProvider};
pub use session::Session;
pub use view::{DashboardView, Timeframe, ViewState};
