pub mod caching;
pub mod coinmarketcap;

pub use caching::CachingSnapshotProvider;
pub use coinmarketcap::CoinMarketCapProvider;
