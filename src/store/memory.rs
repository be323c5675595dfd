use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Store;
use crate::error::{PartialInsert, StoreError};
use crate::record::{CustomerSummary, Transaction, ValidatedRecord};

#[derive(Default)]
struct Tables {
    customers: Vec<ValidatedRecord>,
    customer_ids: HashSet<Uuid>,
    emails: HashSet<String>,
    transactions: Vec<Transaction>,
    transaction_ids: HashSet<Uuid>,
}

/// An in-memory store using a `RwLock` around plain collections.
///
/// Bulk inserts take the write lock once per chunk, mirroring the per-chunk
/// transactions of the persistent backend.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    chunk_size: usize,
}

impl InMemoryStore {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            chunk_size: chunk_size.max(1),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Store for InMemoryStore {
    fn bulk_insert_customers(&self, records: Vec<ValidatedRecord>) -> Result<usize, PartialInsert> {
        let mut written = 0;
        let mut rows = records.into_iter().peekable();

        while rows.peek().is_some() {
            let mut tables = self.write().map_err(|e| PartialInsert::new(written, e))?;
            for record in rows.by_ref().take(self.chunk_size) {
                if tables.customer_ids.contains(&record.id()) || tables.emails.contains(record.email())
                {
                    continue;
                }
                tables.customer_ids.insert(record.id());
                tables.emails.insert(record.email().to_string());
                tables.customers.push(record);
                written += 1;
            }
        }

        Ok(written)
    }

    fn customers(&self, limit: Option<usize>) -> Result<Vec<CustomerSummary>, StoreError> {
        let tables = self.read()?;
        let limit = limit.unwrap_or(usize::MAX);
        Ok(tables
            .customers
            .iter()
            .take(limit)
            .map(ValidatedRecord::summary)
            .collect())
    }

    fn bulk_insert_transactions(&self, records: Vec<Transaction>) -> Result<usize, PartialInsert> {
        let mut written = 0;
        let mut rows = records.into_iter().peekable();

        while rows.peek().is_some() {
            let mut tables = self.write().map_err(|e| PartialInsert::new(written, e))?;
            for tx in rows.by_ref().take(self.chunk_size) {
                if !tables.customer_ids.contains(&tx.customer_id)
                    || tables.transaction_ids.contains(&tx.id)
                {
                    continue;
                }
                tables.transaction_ids.insert(tx.id);
                tables.transactions.push(tx);
                written += 1;
            }
        }

        Ok(written)
    }

    fn totals_since(&self, since: DateTime<Utc>) -> Result<HashMap<Uuid, f64>, StoreError> {
        let tables = self.read()?;
        let mut totals = HashMap::new();
        for tx in tables.transactions.iter().filter(|tx| tx.time >= since) {
            *totals.entry(tx.customer_id).or_insert(0.0) += tx.amount;
        }
        Ok(totals)
    }

    fn transactions_between(
        &self,
        customer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .transactions
            .iter()
            .filter(|tx| tx.customer_id == customer_id && tx.time >= from && tx.time <= to)
            .cloned()
            .collect())
    }

    fn reset(&self) -> Result<(), StoreError> {
        *self.write()? = Tables::default();
        Ok(())
    }
}
