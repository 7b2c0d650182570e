use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use csv::{ReaderBuilder, WriterBuilder};
use parking_lot::Mutex;
use tracing::{debug, error};
use uuid::Uuid;

use crate::models::{NewTransaction, TransactionRecord};
use crate::store::{LedgerStore, StoreError};

/// Spreadsheet-style ledger kept in a single CSV file.
///
/// The whole sheet is read on every access and rewritten on every mutation,
/// so external edits to the file are picked up immediately. Writers inside
/// this process are serialized; writers in other processes are not.
#[derive(Clone)]
pub struct SheetLedgerStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl SheetLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn with_sheet<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let lock = self.lock.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock();
            f(&path)
        })
            .await
            .map_err(|e| StoreError::Unavailable(format!("sheet task failed: {}", e)))?
    }
}

fn read_sheet(path: &Path) -> Result<Vec<TransactionRecord>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Sheet {} does not exist yet, treating as empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            error!("Failed to open sheet {}: {}", path.display(), e);
            return Err(StoreError::Unavailable(e.to_string()));
        }
    };

    ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file)
        .deserialize::<TransactionRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            error!("Failed to parse sheet {}: {}", path.display(), e);
            StoreError::Unavailable(e.to_string())
        })
}

// Writes to a sibling file first so a failed write never truncates the sheet.
fn write_sheet(path: &Path, records: &[TransactionRecord]) -> Result<(), StoreError> {
    let tmp = path.with_extension("csv.tmp");
    let unavailable = |e: &dyn std::fmt::Display| {
        error!("Failed to write sheet {}: {}", path.display(), e);
        StoreError::Unavailable(e.to_string())
    };

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(&tmp)
        .map_err(|e| unavailable(&e))?;
    for record in records {
        writer.serialize(record).map_err(|e| unavailable(&e))?;
    }
    writer.flush().map_err(|e| unavailable(&e))?;
    drop(writer);

    std::fs::rename(&tmp, path).map_err(|e| unavailable(&e))
}

#[async_trait]
impl LedgerStore for SheetLedgerStore {
    async fn list_all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        self.with_sheet(read_sheet).await
    }

    async fn fetch_one(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
        self.with_sheet(move |path| {
            Ok(read_sheet(path)?.into_iter().find(|r| r.id == id))
        })
            .await
    }

    async fn insert(&self, input: NewTransaction) -> Result<Uuid, StoreError> {
        self.with_sheet(move |path| {
            let mut records = read_sheet(path)?;
            let id = Uuid::new_v4();
            records.push(TransactionRecord::new(id, input));
            write_sheet(path, &records)?;
            Ok(id)
        })
            .await
    }

    async fn update(&self, id: Uuid, input: NewTransaction) -> Result<(), StoreError> {
        self.with_sheet(move |path| {
            let mut records = read_sheet(path)?;
            let slot = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(StoreError::NotFound)?;
            *slot = TransactionRecord::new(id, input);
            write_sheet(path, &records)
        })
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.with_sheet(move |path| {
            let mut records = read_sheet(path)?;
            let before = records.len();
            records.retain(|r| r.id != id);
            if records.len() == before {
                return Err(StoreError::NotFound);
            }
            write_sheet(path, &records)
        })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;
    use chrono::NaiveDate;

    fn input(ticker: &str, side: Side, quantity: f64, price: f64) -> NewTransaction {
        NewTransaction {
            date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            portfolio: "Temettü".to_string(),
            side,
            ticker: ticker.to_string(),
            quantity,
            price,
        }
    }

    #[tokio::test]
    async fn test_missing_sheet_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = SheetLedgerStore::new(dir.path().join("ledger.csv"));

        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");

        let store = SheetLedgerStore::new(&path);
        let buy = store.insert(input("TOASO", Side::Buy, 10.0, 100.0)).await.unwrap();
        store.insert(input("TOASO", Side::Sell, 4.0, 120.0)).await.unwrap();

        let reopened = SheetLedgerStore::new(&path);
        let records = reopened.list_all().await.unwrap();
        assert_eq!(records.len(), 2);

        let first = reopened.fetch_one(buy).await.unwrap().unwrap();
        assert_eq!(first.side, Side::Buy);
        assert_eq!(first.amount, 1000.0);
        assert_eq!(first.portfolio, "Temettü");
    }

    #[tokio::test]
    async fn test_update_and_delete_target_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = SheetLedgerStore::new(dir.path().join("ledger.csv"));

        let keep = store.insert(input("EREGL", Side::Buy, 3.0, 40.0)).await.unwrap();
        let gone = store.insert(input("EREGL", Side::Buy, 1.0, 41.0)).await.unwrap();

        store.update(keep, input("EREGL", Side::Buy, 5.0, 40.0)).await.unwrap();
        store.delete(gone).await.unwrap();

        let records = store.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, keep);
        assert_eq!(records[0].amount, 200.0);
        assert!(matches!(store.delete(gone).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_unreadable_sheet_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, "id,date\nnot-a-uuid,yesterday\n").unwrap();

        let store = SheetLedgerStore::new(&path);
        assert!(matches!(store.list_all().await, Err(StoreError::Unavailable(_))));
    }
}
