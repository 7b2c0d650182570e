use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Thread-safe record of tickers that no quote provider knows about.
///
/// A cached ticker is reported unresolved without calling the provider until
/// its entry expires. Only "not found" outcomes are cached; transient failures
/// are retried on the next refresh.
#[derive(Clone)]
pub struct FailureCache {
    cache: Arc<DashMap<String, DateTime<Utc>>>,
    ttl: Duration,
}

impl FailureCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// True while a recorded miss for `ticker` is still within its TTL.
    pub fn is_failed(&self, ticker: &str) -> bool {
        self.is_failed_at(ticker, Utc::now())
    }

    fn is_failed_at(&self, ticker: &str, now: DateTime<Utc>) -> bool {
        if let Some(entry) = self.cache.get(ticker) {
            let failed_at = *entry.value();
            drop(entry); // release the read lock before a possible remove
            if now < failed_at + self.ttl {
                return true;
            }
            self.cache.remove(ticker);
        }
        false
    }

    pub fn record_not_found(&self, ticker: &str) {
        self.cache.insert(ticker.to_string(), Utc::now());
    }

    pub fn clear(&self, ticker: &str) {
        self.cache.remove(ticker);
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_records_and_clears_ticker() {
        let cache = FailureCache::new(Duration::minutes(60));

        cache.record_not_found("NOPE");
        assert!(cache.is_failed("NOPE"));

        cache.clear("NOPE");
        assert!(!cache.is_failed("NOPE"));
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = FailureCache::new(Duration::minutes(30));
        cache.record_not_found("OLD");

        let later = Utc::now() + Duration::minutes(31);
        assert!(!cache.is_failed_at("OLD", later));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_never_suppresses_lookup() {
        let cache = FailureCache::new(Duration::zero());
        cache.record_not_found("ANY");

        assert!(!cache.is_failed("ANY"));
    }
}
