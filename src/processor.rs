//! Bounded-concurrency validation and secret derivation for a batch.
//!
//! The dispatch loop takes an admission permit *before* spawning each record,
//! so once `workers` records are in flight it stops and waits. Records never
//! share state: every task owns its candidate and hands back one
//! [`IngestionOutcome`]. The call returns only after every task has been
//! joined.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Rejection};
use crate::keying::KeyDeriver;
use crate::record::{CandidateRecord, IngestionOutcome, ValidatedRecord};
use crate::validate::RecordValidator;

/// Output of [`BatchProcessor::process`].
///
/// `validated.len() + rejections.len()` equals the input length. The order of
/// `validated` follows completion, not input order.
#[derive(Debug, Default)]
pub struct ProcessedBatch {
    pub validated: Vec<ValidatedRecord>,
    pub rejections: Vec<Rejection>,
    /// Highest number of records seen in flight at once.
    pub peak_in_flight: usize,
}

impl ProcessedBatch {
    pub fn fail_count(&self) -> usize {
        self.rejections.len()
    }
}

/// Tracks current and peak in-flight work.
#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        let now = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        InFlightGuard(Arc::clone(self))
    }
}

struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Fans a batch of candidates out over a fixed-size worker pool.
#[derive(Clone)]
pub struct BatchProcessor {
    validator: Arc<RecordValidator>,
    deriver: KeyDeriver,
    workers: usize,
}

impl BatchProcessor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_parts(
            RecordValidator::from_config(config),
            KeyDeriver::new(config),
            config.worker_count(),
        )
    }

    pub fn with_parts(validator: RecordValidator, deriver: KeyDeriver, workers: usize) -> Self {
        Self {
            validator: Arc::new(validator),
            deriver,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn process(&self, batch: Vec<CandidateRecord>) -> Result<ProcessedBatch, PipelineError> {
        let total = batch.len();
        let gate = Arc::new(Semaphore::new(self.workers));
        let in_flight = Arc::new(InFlight::default());
        let mut tasks = JoinSet::new();

        for candidate in batch {
            // Blocks here once the pool is saturated.
            let permit = Arc::clone(&gate)
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::GateClosed)?;

            let validator = Arc::clone(&self.validator);
            let deriver = self.deriver.clone();
            let in_flight = Arc::clone(&in_flight);

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let _guard = in_flight.enter();
                prepare(&validator, &deriver, candidate)
            });
        }

        let mut processed = ProcessedBatch {
            validated: Vec::with_capacity(total),
            rejections: Vec::new(),
            peak_in_flight: 0,
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(IngestionOutcome::Accepted(record)) => processed.validated.push(record),
                Ok(IngestionOutcome::Rejected(reason)) => processed.rejections.push(reason),
                Err(err) => {
                    tracing::error!(error = %err, "record worker aborted");
                    processed.rejections.push(Rejection::Aborted(err.to_string()));
                }
            }
        }

        processed.peak_in_flight = in_flight.peak.load(Ordering::Acquire);

        tracing::debug!(
            total,
            accepted = processed.validated.len(),
            rejected = processed.rejections.len(),
            peak_in_flight = processed.peak_in_flight,
            workers = self.workers,
            "batch processed"
        );

        Ok(processed)
    }
}

/// Validate, assign an identity, derive the secret.
fn prepare(
    validator: &RecordValidator,
    deriver: &KeyDeriver,
    candidate: CandidateRecord,
) -> IngestionOutcome {
    if let Err(reason) = validator.validate(&candidate) {
        tracing::trace!(email = %candidate.email, %reason, "candidate rejected");
        return IngestionOutcome::Rejected(reason);
    }

    let id = Uuid::new_v4();
    match deriver.derive(&candidate.password) {
        Ok(hash) => IngestionOutcome::Accepted(ValidatedRecord::new(id, candidate, hash)),
        Err(err) => {
            tracing::warn!(email = %candidate.email, error = %err, "secret derivation failed");
            IngestionOutcome::Rejected(err.into())
        }
    }
}
