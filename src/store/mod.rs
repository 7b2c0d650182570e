//! Durable storage of transaction records.
//!
//! Every backend implements [`LedgerStore`]; the rest of the service only sees
//! the trait object held in `AppState`.

mod memory;
mod postgres;
mod sheet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewTransaction, TransactionRecord};

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;
pub use sheet::SheetLedgerStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("record not found")]
    NotFound,
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Every stored record, in no particular order.
    async fn list_all(&self) -> Result<Vec<TransactionRecord>, StoreError>;

    async fn fetch_one(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError>;

    /// Persists a new record and returns the identifier the store assigned.
    async fn insert(&self, input: NewTransaction) -> Result<Uuid, StoreError>;

    /// Replaces the entered values of an existing record.
    async fn update(&self, id: Uuid, input: NewTransaction) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
