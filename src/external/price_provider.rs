use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("ticker not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,
}

/// Best-effort source of the latest traded price for a ticker.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// One attempt, no retries. Implementations report a missing or
    /// non-positive price as an error rather than returning zero.
    async fn fetch_latest(&self, ticker: &str) -> Result<f64, PriceProviderError>;

    fn name(&self) -> &'static str;
}

/// Provider used when no quote service is configured; every ticker needs a manual price.
pub struct OfflineProvider;

#[async_trait]
impl PriceProvider for OfflineProvider {
    async fn fetch_latest(&self, _ticker: &str) -> Result<f64, PriceProviderError> {
        Err(PriceProviderError::NotFound)
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

pub(crate) fn ensure_positive(price: f64) -> Result<f64, PriceProviderError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(PriceProviderError::BadResponse(format!("unusable price {}", price)))
    }
}
