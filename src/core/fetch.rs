//! Snapshot fetching abstractions and the fetch error taxonomy

use crate::core::coin::{CurrencyUnit, Snapshot};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Broad class of a [`FetchError`], for callers that only need to branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network,
    Auth,
    Schema,
}

/// Errors produced while loading a snapshot from the market-data provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the response did not arrive in time.
    #[error("Market data unavailable, retry later: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider rejected the request, usually because of the API key.
    #[error("Provider rejected the request with status {status}: {message}")]
    Auth { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected provider response: {}", describe_schema(.index, .symbol, .field))]
    Schema {
        index: Option<usize>,
        symbol: Option<String>,
        field: String,
    },
}

fn describe_schema(index: &Option<usize>, symbol: &Option<String>, field: &str) -> String {
    match (index, symbol) {
        (Some(i), Some(s)) => format!("entry {i} ({s}) has missing or invalid `{field}`"),
        (Some(i), None) => format!("entry {i} has missing or invalid `{field}`"),
        _ => format!("missing or invalid `{field}`"),
    }
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network(_) => FetchErrorKind::Network,
            FetchError::Auth { .. } => FetchErrorKind::Auth,
            FetchError::Schema { .. } => FetchErrorKind::Schema,
        }
    }

    pub(crate) fn schema(field: impl Into<String>) -> Self {
        FetchError::Schema {
            index: None,
            symbol: None,
            field: field.into(),
        }
    }
}

/// Loads the top 100 listings quoted in one currency unit.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn load(&self, currency: CurrencyUnit) -> Result<Arc<Snapshot>, FetchError>;
}

#[async_trait]
impl<T: SnapshotProvider + ?Sized> SnapshotProvider for Arc<T> {
    async fn load(&self, currency: CurrencyUnit) -> Result<Arc<Snapshot>, FetchError> {
        (**self).load(currency).await
    }
}
