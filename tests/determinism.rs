//! Derived secrets depend only on the secret and the configured salt.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use seedline::store::InMemoryStore;
use seedline::synth::CustomerFactory;
use seedline::{
    BatchProcessor, CustomerSummary, IngestLimits, IngestPipeline, KeyDeriver, PartialInsert,
    PipelineConfig, RecordSource, Store, StoreError, Transaction, ValidatedRecord,
};
use uuid::Uuid;

fn config(salt: &str, workers: usize) -> PipelineConfig {
    PipelineConfig::default()
        .with_salt(salt)
        .with_max_workers(workers)
}

/// Delegates to an in-memory store and remembers each email's stored hash.
#[derive(Default)]
struct RecordingStore {
    inner: InMemoryStore,
    hashes: Mutex<HashMap<String, String>>,
}

impl Store for RecordingStore {
    fn bulk_insert_customers(&self, records: Vec<ValidatedRecord>) -> Result<usize, PartialInsert> {
        {
            let mut hashes = self.hashes.lock().unwrap();
            for record in &records {
                hashes.insert(record.email().to_string(), record.password_hash().to_string());
            }
        }
        self.inner.bulk_insert_customers(records)
    }

    fn customers(&self, limit: Option<usize>) -> Result<Vec<CustomerSummary>, StoreError> {
        self.inner.customers(limit)
    }

    fn bulk_insert_transactions(&self, records: Vec<Transaction>) -> Result<usize, PartialInsert> {
        self.inner.bulk_insert_transactions(records)
    }

    fn totals_since(&self, since: DateTime<Utc>) -> Result<HashMap<Uuid, f64>, StoreError> {
        self.inner.totals_since(since)
    }

    fn transactions_between(
        &self,
        customer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.inner.transactions_between(customer_id, from, to)
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.inner.reset()
    }
}

#[test]
fn same_salt_same_hash_across_derivers() {
    let a = KeyDeriver::new(&config("shared", 1));
    let b = KeyDeriver::new(&config("shared", 8));
    let other = KeyDeriver::new(&config("different", 1));

    for secret in ["12345678", "correct horse battery", "ünïcødé-sécret"] {
        let ha = a.derive(secret).unwrap();
        assert_eq!(ha, a.derive(secret).unwrap());
        assert_eq!(ha, b.derive(secret).unwrap());
        assert_ne!(ha, other.derive(secret).unwrap());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_count_does_not_change_the_output() {
    let batch = CustomerFactory.generate(24);

    let mut runs = Vec::new();
    for workers in [1, 3, 8] {
        let processed = BatchProcessor::new(&config("stable", workers))
            .process(batch.clone())
            .await
            .unwrap();
        assert!(processed.rejections.is_empty());
        // completion order varies with the pool; compare keyed by email
        let by_email: BTreeMap<String, String> = processed
            .validated
            .iter()
            .map(|r| (r.email().to_string(), r.password_hash().to_string()))
            .collect();
        runs.push(by_email);
    }

    assert_eq!(runs[0].len(), 24);
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}

#[tokio::test]
async fn stored_hash_is_the_derived_form() {
    let cfg = config("stored", 4);
    let store = Arc::new(RecordingStore::default());
    let pipeline = IngestPipeline::new(&cfg, store.clone(), IngestLimits::default());

    let batch = CustomerFactory.generate(6);
    let report = pipeline.ingest_customers(batch.clone()).await.unwrap();
    assert_eq!(report.result.success_count, 6);

    let deriver = KeyDeriver::new(&cfg);
    let hashes = store.hashes.lock().unwrap();
    for candidate in &batch {
        let stored = &hashes[&candidate.email];
        assert_ne!(stored, &candidate.password);
        assert_eq!(stored, &deriver.derive(&candidate.password).unwrap());
    }
}
