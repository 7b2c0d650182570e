use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{NewTransaction, TickerLedger, TransactionInput, TransactionRecord};
use crate::store::{LedgerStore, StoreError};

// Entry-form minimums.
pub const MIN_QUANTITY: f64 = 0.0001;
pub const MIN_PRICE: f64 = 0.01;
pub const MAX_PORTFOLIO_LABEL_LEN: usize = 64;

fn ticker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9][A-Z0-9.\-]*$").expect("ticker pattern compiles"))
}

pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Rejects malformed entries and normalizes the rest. Nothing that fails here
/// ever reaches a store or the aggregator.
pub fn validate(input: TransactionInput) -> Result<NewTransaction, AppError> {
    let ticker = normalize_ticker(&input.ticker);
    if ticker.is_empty() {
        return Err(AppError::Validation("Ticker cannot be empty".into()));
    }
    if !ticker_pattern().is_match(&ticker) {
        return Err(AppError::Validation(format!("Invalid ticker: {}", ticker)));
    }
    if !input.quantity.is_finite() || input.quantity < MIN_QUANTITY {
        return Err(AppError::Validation(format!("Quantity must be at least {}", MIN_QUANTITY)));
    }
    if !input.price.is_finite() || input.price < MIN_PRICE {
        return Err(AppError::Validation(format!("Price must be at least {}", MIN_PRICE)));
    }

    let portfolio = input.portfolio.trim().to_string();
    if portfolio.chars().count() > MAX_PORTFOLIO_LABEL_LEN {
        return Err(AppError::Validation(format!(
            "Portfolio label must be at most {} characters", MAX_PORTFOLIO_LABEL_LEN
        )));
    }

    Ok(NewTransaction {
        date: input.date.unwrap_or_else(|| Utc::now().date_naive()),
        portfolio,
        side: input.side,
        ticker,
        quantity: input.quantity,
        price: input.price,
    })
}

/// Loads the whole ledger, degrading to an empty one when the store is down.
///
/// The flag is false when the fallback was taken.
pub async fn list_or_empty(store: &dyn LedgerStore) -> (Vec<TransactionRecord>, bool) {
    match store.list_all().await {
        Ok(records) => (records, true),
        Err(e) => {
            warn!("Ledger store unavailable, showing empty ledger: {}", e);
            (Vec::new(), false)
        }
    }
}

/// Records sorted by ticker then date, optionally limited to one ticker.
pub async fn list(store: &dyn LedgerStore, ticker: Option<&str>) -> (Vec<TransactionRecord>, bool) {
    let (mut records, available) = list_or_empty(store).await;
    if let Some(ticker) = ticker.map(normalize_ticker).filter(|t| !t.is_empty()) {
        records.retain(|r| normalize_ticker(&r.ticker) == ticker);
    }
    sort_ledger(&mut records);
    (records, available)
}

pub async fn list_by_ticker(store: &dyn LedgerStore) -> (Vec<TickerLedger>, bool) {
    let (records, available) = list_or_empty(store).await;
    (group_by_ticker(records), available)
}

pub fn sort_ledger(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| {
        normalize_ticker(&a.ticker)
            .cmp(&normalize_ticker(&b.ticker))
            .then(a.date.cmp(&b.date))
    });
}

pub fn group_by_ticker(records: Vec<TransactionRecord>) -> Vec<TickerLedger> {
    let mut grouped: BTreeMap<String, Vec<TransactionRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(normalize_ticker(&record.ticker)).or_default().push(record);
    }
    grouped
        .into_iter()
        .map(|(ticker, mut transactions)| {
            transactions.sort_by(|a, b| a.date.cmp(&b.date));
            TickerLedger { ticker, transactions }
        })
        .collect()
}

pub async fn fetch_one(store: &dyn LedgerStore, id: Uuid) -> Result<TransactionRecord, AppError> {
    store.fetch_one(id).await?.ok_or(AppError::NotFound)
}

pub async fn create(store: &dyn LedgerStore, input: TransactionInput) -> Result<Uuid, AppError> {
    let new = validate(input)?;
    let ticker = new.ticker.clone();
    let id = store.insert(new).await.map_err(|e| {
        error!("Failed to record transaction for {}: {}", ticker, e);
        AppError::from(e)
    })?;
    info!("Recorded transaction {} for {}", id, ticker);
    Ok(id)
}

pub async fn update(
    store: &dyn LedgerStore,
    id: Uuid,
    input: TransactionInput,
) -> Result<TransactionRecord, AppError> {
    let new = validate(input)?;
    match store.update(id, new.clone()).await {
        Ok(()) => Ok(TransactionRecord::new(id, new)),
        Err(StoreError::NotFound) => Err(AppError::NotFound),
        Err(e) => {
            error!("Failed to update transaction {}: {}", id, e);
            Err(e.into())
        }
    }
}

pub async fn delete(store: &dyn LedgerStore, id: Uuid) -> Result<(), AppError> {
    store.delete(id).await.map_err(|e| {
        if !matches!(e, StoreError::NotFound) {
            error!("Failed to delete transaction {}: {}", id, e);
        }
        AppError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;
    use crate::store::MemoryLedgerStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn input(ticker: &str, quantity: f64, price: f64) -> TransactionInput {
        TransactionInput {
            date: NaiveDate::from_ymd_opt(2024, 2, 1),
            portfolio: "  Temettü ".to_string(),
            side: Side::Buy,
            ticker: ticker.to_string(),
            quantity,
            price,
        }
    }

    struct DownStore;

    #[async_trait]
    impl LedgerStore for DownStore {
        async fn list_all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn fetch_one(&self, _id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn insert(&self, _input: NewTransaction) -> Result<Uuid, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn update(&self, _id: Uuid, _input: NewTransaction) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _id: Uuid) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn test_validate_normalizes_ticker_and_label() {
        let new = validate(input("  toaso ", 1.5, 230.0)).unwrap();
        assert_eq!(new.ticker, "TOASO");
        assert_eq!(new.portfolio, "Temettü");
        assert_eq!(new.amount(), 345.0);
    }

    #[test]
    fn test_validate_defaults_date_to_today() {
        let mut raw = input("SASA", 1.0, 1.0);
        raw.date = None;
        assert_eq!(validate(raw).unwrap().date, Utc::now().date_naive());
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        assert!(matches!(validate(input("   ", 1.0, 1.0)), Err(AppError::Validation(_))));
        assert!(matches!(validate(input("BAD TICKER", 1.0, 1.0)), Err(AppError::Validation(_))));
        assert!(matches!(validate(input("OK", 0.0, 1.0)), Err(AppError::Validation(_))));
        assert!(matches!(validate(input("OK", -2.0, 1.0)), Err(AppError::Validation(_))));
        assert!(matches!(validate(input("OK", 1.0, 0.0)), Err(AppError::Validation(_))));
        assert!(matches!(validate(input("OK", f64::NAN, 1.0)), Err(AppError::Validation(_))));
        assert!(matches!(validate(input("OK", 1.0, f64::INFINITY)), Err(AppError::Validation(_))));

        let mut long_label = input("OK", 1.0, 1.0);
        long_label.portfolio = "x".repeat(MAX_PORTFOLIO_LABEL_LEN + 1);
        assert!(matches!(validate(long_label), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unavailable_store_degrades_to_empty_list() {
        let (records, available) = list(&DownStore, None).await;
        assert!(records.is_empty());
        assert!(!available);
    }

    #[tokio::test]
    async fn test_writes_to_unavailable_store_are_reported() {
        let result = create(&DownStore, input("AKSA", 1.0, 1.0)).await;
        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let store = MemoryLedgerStore::new();
        let mut late = input("froto", 1.0, 10.0);
        late.date = NaiveDate::from_ymd_opt(2024, 6, 1);
        create(&store, late).await.unwrap();
        create(&store, input("FROTO", 2.0, 10.0)).await.unwrap();
        create(&store, input("ALARK", 3.0, 10.0)).await.unwrap();

        let (all, available) = list(&store, None).await;
        assert!(available);
        let tickers: Vec<_> = all.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["ALARK", "FROTO", "FROTO"]);
        assert!(all[1].date < all[2].date);

        let (froto, _) = list(&store, Some("froto")).await;
        assert_eq!(froto.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let store = MemoryLedgerStore::new();
        let missing = Uuid::new_v4();

        assert!(matches!(update(&store, missing, input("X", 1.0, 1.0)).await, Err(AppError::NotFound)));
        assert!(matches!(delete(&store, missing).await, Err(AppError::NotFound)));
    }

    #[test]
    fn test_group_by_ticker_orders_by_date() {
        let mk = |ticker: &str, day: u32| TransactionRecord {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            portfolio: String::new(),
            side: Side::Buy,
            ticker: ticker.to_string(),
            quantity: 1.0,
            price: 1.0,
            amount: 1.0,
        };

        let grouped = group_by_ticker(vec![mk("B", 9), mk("A", 3), mk("B", 2)]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].ticker, "A");
        assert_eq!(grouped[1].transactions[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[tokio::test]
    async fn test_hand_edited_lowercase_ticker_joins_its_ledger() {
        let store = MemoryLedgerStore::new();
        let raw = |ticker: &str, day: u32| NewTransaction {
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            portfolio: String::new(),
            side: Side::Buy,
            ticker: ticker.to_string(),
            quantity: 1.0,
            price: 1.0,
        };
        // Written straight to the store, as an edit of the sheet file would be.
        store.insert(raw(" thyao", 2)).await.unwrap();
        store.insert(raw("THYAO", 1)).await.unwrap();

        let (filtered, _) = list(&store, Some("THYAO")).await;
        assert_eq!(filtered.len(), 2);

        let (grouped, _) = list_by_ticker(&store).await;
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].ticker, "THYAO");
        assert_eq!(grouped[0].transactions.len(), 2);
    }
}
