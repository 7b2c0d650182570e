use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::db::transaction_queries;
use crate::models::{NewTransaction, TransactionRecord, TransactionRow};
use crate::store::{LedgerStore, StoreError};

/// Ledger backed by the `transactions` table.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode(row: TransactionRow) -> Result<TransactionRecord, StoreError> {
    let id = row.id;
    TransactionRecord::try_from(row).map_err(|e| {
        error!("Corrupt transaction row {}: {}", id, e);
        StoreError::Unavailable(e)
    })
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn list_all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        transaction_queries::fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn fetch_one(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
        transaction_queries::fetch_one(&self.pool, id)
            .await?
            .map(decode)
            .transpose()
    }

    async fn insert(&self, input: NewTransaction) -> Result<Uuid, StoreError> {
        Ok(transaction_queries::create(&self.pool, &input).await?)
    }

    async fn update(&self, id: Uuid, input: NewTransaction) -> Result<(), StoreError> {
        match transaction_queries::update(&self.pool, id, &input).await? {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match transaction_queries::delete(&self.pool, id).await? {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }
}
