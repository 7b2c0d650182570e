use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::{NewTransaction, TransactionRecord};
use crate::store::{LedgerStore, StoreError};

/// Process-local ledger. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    records: Arc<RwLock<HashMap<Uuid, TransactionRecord>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn list_all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self.records.read().values().cloned().collect())
    }

    async fn fetch_one(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn insert(&self, input: NewTransaction) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.records
            .write()
            .insert(id, TransactionRecord::new(id, input));
        Ok(id)
    }

    async fn update(&self, id: Uuid, input: NewTransaction) -> Result<(), StoreError> {
        let mut records = self.records.write();
        match records.get_mut(&id) {
            Some(existing) => {
                *existing = TransactionRecord::new(id, input);
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match self.records.write().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}
