use std::collections::HashMap;

use futures::future::join_all;
use tracing::{info, warn};

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::PriceLookup;
use crate::services::failure_cache::FailureCache;

/// Looks up the latest price of one ticker. A single attempt; every failure
/// becomes `Unavailable` so the row can be completed manually.
pub async fn fetch_latest(
    provider: &dyn PriceProvider,
    ticker: &str,
    failure_cache: &FailureCache,
) -> PriceLookup {
    if failure_cache.is_failed(ticker) {
        info!("⚠️ Skipping quote for {} - recently reported as unknown", ticker);
        return PriceLookup::Unavailable;
    }

    match provider.fetch_latest(ticker).await {
        Ok(price) if price.is_finite() && price > 0.0 => {
            failure_cache.clear(ticker);
            PriceLookup::Resolved(price)
        }
        Ok(price) => {
            warn!("{} returned unusable price {} for {}", provider.name(), price, ticker);
            PriceLookup::Unavailable
        }
        Err(PriceProviderError::NotFound) => {
            warn!("No quote available for {}", ticker);
            failure_cache.record_not_found(ticker);
            PriceLookup::Unavailable
        }
        Err(e) => {
            warn!("Quote lookup for {} failed: {}", ticker, e);
            PriceLookup::Unavailable
        }
    }
}

/// Fetches quotes for all tickers concurrently; the result has one entry per ticker.
pub async fn fetch_latest_batch<I, S>(
    provider: &dyn PriceProvider,
    tickers: I,
    failure_cache: &FailureCache,
) -> HashMap<String, PriceLookup>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tickers: Vec<String> = tickers.into_iter().map(|t| t.as_ref().to_string()).collect();

    let lookups = join_all(
        tickers
            .iter()
            .map(|ticker| fetch_latest(provider, ticker, failure_cache)),
    )
        .await;

    tickers.into_iter().zip(lookups).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TableProvider {
        prices: HashMap<&'static str, f64>,
        calls: AtomicUsize,
    }

    impl TableProvider {
        fn new(prices: &[(&'static str, f64)]) -> Self {
            Self {
                prices: prices.iter().cloned().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceProvider for TableProvider {
        async fn fetch_latest(&self, ticker: &str) -> Result<f64, PriceProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match ticker {
                "DOWN" => Err(PriceProviderError::Network("connection reset".into())),
                _ => self.prices.get(ticker).copied().ok_or(PriceProviderError::NotFound),
            }
        }

        fn name(&self) -> &'static str {
            "table"
        }
    }

    #[tokio::test]
    async fn test_batch_has_entry_per_ticker() {
        let provider = TableProvider::new(&[("KOZAL", 25.4), ("ZERO", 0.0)]);
        let cache = FailureCache::new(Duration::minutes(60));

        let prices = fetch_latest_batch(&provider, ["KOZAL", "MISSING", "DOWN", "ZERO"], &cache).await;

        assert_eq!(prices.len(), 4);
        assert_eq!(prices["KOZAL"], PriceLookup::Resolved(25.4));
        assert_eq!(prices["MISSING"], PriceLookup::Unavailable);
        assert_eq!(prices["DOWN"], PriceLookup::Unavailable);
        assert_eq!(prices["ZERO"], PriceLookup::Unavailable);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_unknown_ticker_not_requeried_within_ttl() {
        let provider = TableProvider::new(&[]);
        let cache = FailureCache::new(Duration::minutes(60));

        fetch_latest(&provider, "GONE", &cache).await;
        fetch_latest(&provider, "GONE", &cache).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_not_cached() {
        let provider = TableProvider::new(&[]);
        let cache = FailureCache::new(Duration::minutes(60));

        fetch_latest(&provider, "DOWN", &cache).await;
        fetch_latest(&provider, "DOWN", &cache).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
