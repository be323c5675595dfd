//! Storage collaborator for customers and transactions.
//!
//! The pipeline only depends on the [`Store`] trait. The contract that
//! matters is on the bulk inserts: rows that collide with an existing unique
//! key are skipped silently, and the returned count is exactly the number of
//! newly written rows. When a write fails part way the error carries the
//! number of rows committed before it ([`PartialInsert`]).
//!
//! Implementations are synchronous; async callers go through
//! `tokio::task::spawn_blocking`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PartialInsert, PipelineError, StoreError};
use crate::record::{CustomerSummary, Transaction, ValidatedRecord};

mod memory;
#[cfg(feature = "embedded")]
mod redb_store;

pub use memory::InMemoryStore;
#[cfg(feature = "embedded")]
pub use redb_store::RedbStore;

/// Persistence operations used by the ingestion and reporting paths.
pub trait Store: Send + Sync {
    /// Insert customers, skipping any whose id or email already exists.
    fn bulk_insert_customers(&self, records: Vec<ValidatedRecord>) -> Result<usize, PartialInsert>;

    /// Customers in storage order, at most `limit` when given.
    fn customers(&self, limit: Option<usize>) -> Result<Vec<CustomerSummary>, StoreError>;

    /// Insert transactions, skipping duplicates and ones whose customer is
    /// unknown.
    fn bulk_insert_transactions(&self, records: Vec<Transaction>) -> Result<usize, PartialInsert>;

    /// Sum of transaction amounts per customer for transactions at or after
    /// `since`.
    fn totals_since(&self, since: DateTime<Utc>) -> Result<HashMap<Uuid, f64>, StoreError>;

    /// A customer's transactions with `from <= time <= to`.
    fn transactions_between(
        &self,
        customer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Remove every customer and, with them, every transaction.
    fn reset(&self) -> Result<(), StoreError>;
}

/// Selects and builds a [`Store`] backend.
///
/// ```
/// use seedline::store::StoreConfig;
///
/// let store = StoreConfig::in_memory().build(100).unwrap();
/// assert!(store.customers(None).unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    InMemory,
    /// redb database file; requires the `embedded` feature.
    Redb { path: String },
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        StoreConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        StoreConfig::Redb { path: path.into() }
    }

    /// Build the backend. `chunk_size` is the number of rows written per
    /// transaction during bulk inserts.
    pub fn build(&self, chunk_size: usize) -> Result<Arc<dyn Store>, StoreError> {
        match self {
            StoreConfig::InMemory => Ok(Arc::new(InMemoryStore::new(chunk_size))),
            StoreConfig::Redb { path } => {
                #[cfg(feature = "embedded")]
                {
                    Ok(Arc::new(RedbStore::open(path, chunk_size)?))
                }
                #[cfg(not(feature = "embedded"))]
                {
                    let _ = path;
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// Run a store call on the blocking pool.
pub async fn blocking<T, F>(store: &Arc<dyn Store>, f: F) -> Result<T, PipelineError>
where
    F: FnOnce(&dyn Store) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_is_tagged_by_backend() {
        let cfg: StoreConfig =
            serde_json::from_str(r#"{"backend":"redb","path":"/tmp/x.redb"}"#).unwrap();
        assert_eq!(cfg, StoreConfig::redb("/tmp/x.redb"));

        let cfg: StoreConfig = serde_json::from_str(r#"{"backend":"in_memory"}"#).unwrap();
        assert_eq!(cfg, StoreConfig::InMemory);
    }
}
