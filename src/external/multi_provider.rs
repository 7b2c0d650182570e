use crate::external::price_provider::{PriceProvider, PriceProviderError};
use async_trait::async_trait;
use tracing::{info, warn};

/// Tries each provider in order and returns the first price found.
///
/// Each provider is asked exactly once per lookup. If every provider fails,
/// a rate limit from any of them is reported over a plain miss so callers can
/// tell "try later" from "unknown ticker".
pub struct MultiProvider {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl MultiProvider {
    pub fn new(providers: Vec<Box<dyn PriceProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl PriceProvider for MultiProvider {
    async fn fetch_latest(&self, ticker: &str) -> Result<f64, PriceProviderError> {
        let mut last_error = PriceProviderError::NotFound;

        for provider in &self.providers {
            match provider.fetch_latest(ticker).await {
                Ok(price) => {
                    info!("✓ Quote for {} from {}", ticker, provider.name());
                    return Ok(price);
                }
                Err(PriceProviderError::NotFound) => {
                    info!("{} has no quote for {}, trying next provider", provider.name(), ticker);
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", provider.name(), ticker, e);
                    if !matches!(last_error, PriceProviderError::RateLimited) {
                        last_error = e;
                    }
                }
            }
        }

        Err(last_error)
    }

    fn name(&self) -> &'static str {
        "multi"
    }
}
