use std::collections::HashMap;

use tracing::info;

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{PortfolioValuation, SummaryResponse, TransactionRecord};
use crate::services::failure_cache::FailureCache;
use crate::services::position_service::{aggregate, price_positions};
use crate::services::price_service;
use crate::services::transaction_service::{list_or_empty, normalize_ticker};
use crate::store::LedgerStore;

/// Normalizes override keys and rejects prices that could not be a trade price.
pub fn validate_overrides(raw: HashMap<String, f64>) -> Result<HashMap<String, f64>, AppError> {
    raw.into_iter()
        .map(|(ticker, price)| {
            let ticker = normalize_ticker(&ticker);
            if ticker.is_empty() {
                return Err(AppError::Validation("Override ticker cannot be empty".into()));
            }
            if !price.is_finite() || price <= 0.0 {
                return Err(AppError::Validation(format!("Override price for {} must be > 0", ticker)));
            }
            Ok((ticker, price))
        })
        .collect()
}

/// Values an already-loaded ledger: aggregate, quote the open tickers, then price.
pub async fn value_records(
    records: &[TransactionRecord],
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    overrides: &HashMap<String, f64>,
) -> PortfolioValuation {
    let summary = aggregate(records);
    let prices = price_service::fetch_latest_batch(provider, summary.keys(), failure_cache).await;
    let valuation = price_positions(&summary, &prices, overrides);

    if !valuation.unresolved.is_empty() {
        info!(
            "{} position(s) need a manual price: {}",
            valuation.unresolved.len(),
            valuation.unresolved.join(", ")
        );
    }
    valuation
}

/// Full recompute of the current holdings view. Never fails on store or quote
/// outages; those degrade to an empty ledger or unresolved prices.
pub async fn portfolio_summary(
    store: &dyn LedgerStore,
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    overrides: HashMap<String, f64>,
) -> Result<SummaryResponse, AppError> {
    let overrides = validate_overrides(overrides)?;
    let (records, ledger_available) = list_or_empty(store).await;
    let valuation = value_records(&records, provider, failure_cache, &overrides).await;

    Ok(SummaryResponse {
        ledger_available,
        valuation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_keys_normalized() {
        let mut raw = HashMap::new();
        raw.insert(" toaso ".to_string(), 231.5);

        let overrides = validate_overrides(raw).unwrap();
        assert_eq!(overrides.get("TOASO"), Some(&231.5));
    }

    #[test]
    fn test_non_positive_override_rejected() {
        for bad in [0.0, -1.0, f64::NAN] {
            let mut raw = HashMap::new();
            raw.insert("TOASO".to_string(), bad);
            assert!(matches!(validate_overrides(raw), Err(AppError::Validation(_))));
        }
    }
}
