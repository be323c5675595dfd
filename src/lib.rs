//! Synthetic customer generation and concurrent bulk ingestion.
//!
//! The crate holds both halves of the pipeline; the two services in
//! `crates/` only add HTTP around them.
//!
//! Server side, a batch of [`CandidateRecord`]s goes through
//! [`IngestPipeline::ingest_customers`]:
//!
//! 1. the [`BatchProcessor`] validates every record and derives its secret
//!    on a bounded worker pool,
//! 2. the validated set is written through a [`Store`] in chunked
//!    transactions that skip duplicates,
//! 3. [`reduce`](reduce::reduce) folds validation failures and skipped rows
//!    into one [`BatchResult`].
//!
//! Client side, [`AdaptiveRetryLoop`] keeps regenerating exactly the number
//! of records that failed until nothing fails or no progress is made for
//! `stagnation_limit` rounds in a row.
//!
//! ```no_run
//! use std::sync::Arc;
//! use seedline::{IngestLimits, IngestPipeline, PipelineConfig, store::InMemoryStore};
//! use seedline::synth::CustomerFactory;
//! use seedline::retry::RecordSource;
//!
//! # async fn run() -> Result<(), seedline::PipelineError> {
//! let config = PipelineConfig::default().with_salt("example");
//! let pipeline = IngestPipeline::new(&config, Arc::new(InMemoryStore::default()), IngestLimits::default());
//!
//! let report = pipeline.ingest_customers(CustomerFactory.generate(100)).await?;
//! assert_eq!(report.result.total(), 100);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod keying;
pub mod processor;
pub mod record;
pub mod reduce;
pub mod report;
pub mod retry;
pub mod store;
pub mod synth;
pub mod validate;

pub use config::{PipelineConfig, RetryConfig};
pub use error::{
    ConfigError, DerivationError, PartialInsert, PipelineError, Rejection, StoreError,
};
pub use ingest::{IngestLimits, IngestPipeline, IngestReport};
pub use keying::KeyDeriver;
pub use processor::{BatchProcessor, ProcessedBatch};
pub use record::{
    BatchResult, CandidateRecord, CustomerReport, CustomerSummary, Gender, IngestionOutcome,
    Transaction, TransactionDraft, ValidatedRecord,
};
pub use retry::{
    AdaptiveRetryLoop, IngestSink, RecordSource, RetryError, RetryReport, RetryState, Timings,
    TransportError,
};
pub use store::{Store, StoreConfig};
pub use validate::{RecordValidator, ValidationRule};
