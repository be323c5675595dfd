//! End-to-end ingestion through processor, store and reducer.

use std::sync::Arc;

use seedline::store::InMemoryStore;
use seedline::synth::CustomerFactory;
use seedline::{
    BatchResult, CandidateRecord, Gender, IngestLimits, IngestPipeline, PipelineConfig,
    RecordSource, Store, StoreConfig,
};

fn config() -> PipelineConfig {
    PipelineConfig::default()
        .with_salt("integration-salt")
        .with_max_workers(4)
}

fn candidate(email: &str, password: &str) -> CandidateRecord {
    CandidateRecord {
        name: "c0ffee00".into(),
        password: password.into(),
        email: email.into(),
        gender: Gender::Other,
    }
}

fn pipeline_with(store: Arc<dyn Store>) -> IngestPipeline {
    IngestPipeline::new(&config(), store, IngestLimits::default())
}

#[tokio::test]
async fn counts_are_conserved_for_mixed_batches() {
    let pipeline = pipeline_with(Arc::new(InMemoryStore::default()));

    for round in 0..4 {
        let mut batch = CustomerFactory.generate(20);
        // some too short, some duplicated within the batch
        for record in batch.iter_mut().step_by(3) {
            record.password.truncate(7);
        }
        let dup = batch[1].clone();
        batch.push(dup);

        let report = pipeline.ingest_customers(batch.clone()).await.unwrap();
        assert_eq!(
            report.result.total(),
            batch.len(),
            "round {round}: {}",
            report.result
        );
        assert!(report.error.is_none());
    }
}

#[tokio::test]
async fn preexisting_contacts_are_attributed_to_failures() {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::default());
    let pipeline = pipeline_with(Arc::clone(&store));

    let seeded: Vec<_> = (0..3)
        .map(|i| candidate(&format!("taken{i}@mail.com"), "password"))
        .collect();
    let report = pipeline.ingest_customers(seeded).await.unwrap();
    assert_eq!(report.result, BatchResult::new(3, 0));

    // N = 10, K = 3 collide with existing rows
    let mut batch: Vec<_> = (0..7)
        .map(|i| candidate(&format!("fresh{i}@mail.com"), "password"))
        .collect();
    batch.extend((0..3).map(|i| candidate(&format!("taken{i}@mail.com"), "password")));

    let report = pipeline.ingest_customers(batch).await.unwrap();
    assert_eq!(report.result, BatchResult::new(7, 3));
    assert_eq!(store.customers(None).unwrap().len(), 10);
}

#[tokio::test]
async fn seven_characters_fail_eight_pass() {
    let pipeline = pipeline_with(Arc::new(InMemoryStore::default()));
    let report = pipeline
        .ingest_customers(vec![
            candidate("seven@mail.com", "1234567"),
            candidate("eight@mail.com", "12345678"),
        ])
        .await
        .unwrap();
    assert_eq!(report.result, BatchResult::new(1, 1));

    let stored = pipeline.store().customers(None).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].email, "eight@mail.com");
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let pipeline = pipeline_with(Arc::new(InMemoryStore::default()));
    let report = pipeline.ingest_customers(Vec::new()).await.unwrap();
    assert_eq!(report.result, BatchResult::new(0, 0));
}

#[cfg(feature = "embedded")]
#[tokio::test]
async fn redb_backend_behaves_like_memory() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("pipeline.redb");
    let store = StoreConfig::redb(path.to_string_lossy())
        .build(config().insert_chunk_size)
        .unwrap();
    let pipeline = pipeline_with(Arc::clone(&store));

    let mut batch = CustomerFactory.generate(15);
    batch.push(batch[0].clone());
    batch.push(candidate("short@mail.com", "short"));

    let report = pipeline.ingest_customers(batch).await.unwrap();
    assert_eq!(report.result, BatchResult::new(15, 2));
    assert_eq!(store.customers(None).unwrap().len(), 15);
}
