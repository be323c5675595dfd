//! redb-backed persistent store.
//!
//! Layout:
//! - `customers`: customer id -> JSON-encoded [`ValidatedRecord`]
//! - `customer_emails`: email -> customer id (uniqueness index)
//! - `transactions`: `"{customer_id}/{transaction_id}"` -> JSON-encoded
//!   [`Transaction`], so one customer's rows form a contiguous key range
//!
//! Bulk inserts commit one write transaction per chunk. A failure returns the
//! rows committed by earlier chunks; the failing chunk is rolled back whole.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use uuid::Uuid;

use super::Store;
use crate::error::{PartialInsert, StoreError};
use crate::record::{CustomerSummary, Transaction, ValidatedRecord};

const CUSTOMERS: TableDefinition<&str, &[u8]> = TableDefinition::new("customers");
const EMAILS: TableDefinition<&str, &str> = TableDefinition::new("customer_emails");
const TRANSACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");

fn backend<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::backend(err.to_string())
}

fn transaction_key(tx: &Transaction) -> String {
    format!("{}/{}", tx.customer_id, tx.id)
}

/// Persistent [`Store`] on a single redb file.
///
/// The `Arc<Database>` is shared across threads; redb handles its own locking
/// and MVCC.
pub struct RedbStore {
    db: Arc<Database>,
    chunk_size: usize,
}

impl RedbStore {
    /// Open or create the database at `path` and make sure all tables exist.
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(backend)?;

        let write_txn = db.begin_write().map_err(backend)?;
        create_tables(&write_txn)?;
        write_txn.commit().map_err(backend)?;

        Ok(Self {
            db: Arc::new(db),
            chunk_size: chunk_size.max(1),
        })
    }

    fn insert_customer_chunk(&self, chunk: &[ValidatedRecord]) -> Result<usize, StoreError> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        let mut written = 0;
        {
            let mut customers = write_txn.open_table(CUSTOMERS).map_err(backend)?;
            let mut emails = write_txn.open_table(EMAILS).map_err(backend)?;

            for record in chunk {
                let id = record.id().to_string();
                if customers.get(id.as_str()).map_err(backend)?.is_some()
                    || emails.get(record.email()).map_err(backend)?.is_some()
                {
                    continue;
                }
                let value =
                    serde_json::to_vec(record).map_err(|e| StoreError::Corrupt(e.to_string()))?;
                customers
                    .insert(id.as_str(), value.as_slice())
                    .map_err(backend)?;
                emails.insert(record.email(), id.as_str()).map_err(backend)?;
                written += 1;
            }
        }
        write_txn.commit().map_err(backend)?;
        Ok(written)
    }

    fn insert_transaction_chunk(&self, chunk: &[Transaction]) -> Result<usize, StoreError> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        let mut written = 0;
        {
            let customers = write_txn.open_table(CUSTOMERS).map_err(backend)?;
            let mut transactions = write_txn.open_table(TRANSACTIONS).map_err(backend)?;

            for tx in chunk {
                let customer = tx.customer_id.to_string();
                if customers.get(customer.as_str()).map_err(backend)?.is_none() {
                    continue;
                }
                let key = transaction_key(tx);
                if transactions.get(key.as_str()).map_err(backend)?.is_some() {
                    continue;
                }
                let value =
                    serde_json::to_vec(tx).map_err(|e| StoreError::Corrupt(e.to_string()))?;
                transactions
                    .insert(key.as_str(), value.as_slice())
                    .map_err(backend)?;
                written += 1;
            }
        }
        write_txn.commit().map_err(backend)?;
        Ok(written)
    }

    fn scan_transactions(
        &self,
        visitor: &mut dyn FnMut(Transaction),
    ) -> Result<(), StoreError> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(TRANSACTIONS).map_err(backend)?;
        for entry in table.iter().map_err(backend)? {
            let (_, value) = entry.map_err(backend)?;
            visitor(decode(value.value())?);
        }
        Ok(())
    }
}

fn create_tables(write_txn: &WriteTransaction) -> Result<(), StoreError> {
    // Opening a table creates it if it doesn't exist.
    write_txn.open_table(CUSTOMERS).map_err(backend)?;
    write_txn.open_table(EMAILS).map_err(backend)?;
    write_txn.open_table(TRANSACTIONS).map_err(backend)?;
    Ok(())
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
}

impl Store for RedbStore {
    fn bulk_insert_customers(&self, records: Vec<ValidatedRecord>) -> Result<usize, PartialInsert> {
        let mut written = 0;
        for chunk in records.chunks(self.chunk_size) {
            match self.insert_customer_chunk(chunk) {
                Ok(n) => written += n,
                Err(err) => return Err(PartialInsert::new(written, err)),
            }
        }
        Ok(written)
    }

    fn customers(&self, limit: Option<usize>) -> Result<Vec<CustomerSummary>, StoreError> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(CUSTOMERS).map_err(backend)?;

        let mut out = Vec::new();
        for entry in table.iter().map_err(backend)? {
            if limit.is_some_and(|limit| out.len() >= limit) {
                break;
            }
            let (_, value) = entry.map_err(backend)?;
            let record: ValidatedRecord = decode(value.value())?;
            out.push(record.summary());
        }
        Ok(out)
    }

    fn bulk_insert_transactions(&self, records: Vec<Transaction>) -> Result<usize, PartialInsert> {
        let mut written = 0;
        for chunk in records.chunks(self.chunk_size) {
            match self.insert_transaction_chunk(chunk) {
                Ok(n) => written += n,
                Err(err) => return Err(PartialInsert::new(written, err)),
            }
        }
        Ok(written)
    }

    fn totals_since(&self, since: DateTime<Utc>) -> Result<HashMap<Uuid, f64>, StoreError> {
        let mut totals = HashMap::new();
        self.scan_transactions(&mut |tx| {
            if tx.time >= since {
                *totals.entry(tx.customer_id).or_insert(0.0) += tx.amount;
            }
        })?;
        Ok(totals)
    }

    fn transactions_between(
        &self,
        customer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(TRANSACTIONS).map_err(backend)?;

        // '0' sorts right after '/', bounding this customer's key range.
        let lo = format!("{customer_id}/");
        let hi = format!("{customer_id}0");

        let mut out = Vec::new();
        for entry in table.range(lo.as_str()..hi.as_str()).map_err(backend)? {
            let (_, value) = entry.map_err(backend)?;
            let tx: Transaction = decode(value.value())?;
            if tx.time >= from && tx.time <= to {
                out.push(tx);
            }
        }
        Ok(out)
    }

    fn reset(&self) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        write_txn.delete_table(TRANSACTIONS).map_err(backend)?;
        write_txn.delete_table(EMAILS).map_err(backend)?;
        write_txn.delete_table(CUSTOMERS).map_err(backend)?;
        create_tables(&write_txn)?;
        write_txn.commit().map_err(backend)?;
        Ok(())
    }
}
