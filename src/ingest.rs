//! Server-side ingestion: processor, store and reducer wired together.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, StoreError};
use crate::processor::BatchProcessor;
use crate::record::{BatchResult, CandidateRecord, Transaction, TransactionDraft};
use crate::reduce::reduce;
use crate::store::{self, Store};

/// Upper bounds enforced before a batch reaches the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestLimits {
    #[serde(default = "default_max_customer_batch")]
    pub max_customer_batch: usize,
    #[serde(default = "default_max_transaction_batch")]
    pub max_transaction_batch: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_customer_batch: default_max_customer_batch(),
            max_transaction_batch: default_max_transaction_batch(),
        }
    }
}

fn default_max_customer_batch() -> usize {
    2000
}

fn default_max_transaction_batch() -> usize {
    5000
}

/// Outcome of one ingested batch.
///
/// `result` is always reconciled, even when `error` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub result: BatchResult,
    pub error: Option<StoreError>,
    pub peak_in_flight: usize,
}

impl IngestReport {
    /// Treat a hard storage failure as an error carrying the partial counts.
    pub fn into_result(self) -> Result<BatchResult, PipelineError> {
        match self.error {
            None => Ok(self.result),
            Some(source) => Err(PipelineError::Persistence {
                result: self.result,
                source,
            }),
        }
    }
}

/// Validates, derives and persists incoming batches.
#[derive(Clone)]
pub struct IngestPipeline {
    processor: BatchProcessor,
    store: Arc<dyn Store>,
    limits: IngestLimits,
}

impl IngestPipeline {
    pub fn new(config: &PipelineConfig, store: Arc<dyn Store>, limits: IngestLimits) -> Self {
        Self::with_processor(BatchProcessor::new(config), store, limits)
    }

    pub fn with_processor(
        processor: BatchProcessor,
        store: Arc<dyn Store>,
        limits: IngestLimits,
    ) -> Self {
        Self {
            processor,
            store,
            limits,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn limits(&self) -> IngestLimits {
        self.limits
    }

    pub fn workers(&self) -> usize {
        self.processor.workers()
    }

    /// Ingest a batch of candidate customers.
    pub async fn ingest_customers(
        &self,
        batch: Vec<CandidateRecord>,
    ) -> Result<IngestReport, PipelineError> {
        let submitted = batch.len();
        if submitted > self.limits.max_customer_batch {
            return Err(PipelineError::BatchTooLarge {
                len: submitted,
                max: self.limits.max_customer_batch,
            });
        }

        let processed = self.processor.process(batch).await?;
        let failures = processed.fail_count();
        let peak_in_flight = processed.peak_in_flight;
        let records = processed.validated;
        let validated = records.len();

        let written = if records.is_empty() {
            Ok(0)
        } else {
            store::blocking(&self.store, move |store| store.bulk_insert_customers(records)).await?
        };

        let reduced = reduce(failures, validated, written);
        debug_assert_eq!(reduced.result.total(), submitted);

        if let Some(err) = &reduced.error {
            tracing::error!(error = %err, result = %reduced.result, "customer bulk insert failed");
        }
        tracing::info!(
            submitted,
            success = reduced.result.success_count,
            fail = reduced.result.fail_count,
            peak_in_flight,
            "customer batch ingested"
        );

        Ok(IngestReport {
            result: reduced.result,
            error: reduced.error,
            peak_in_flight,
        })
    }

    /// Ingest a batch of generated transactions. Drafts with a negative or
    /// non-finite amount are rejected; unknown customers are skipped by the
    /// store. Both count as failures.
    pub async fn ingest_transactions(
        &self,
        drafts: Vec<TransactionDraft>,
    ) -> Result<IngestReport, PipelineError> {
        let submitted = drafts.len();
        if submitted > self.limits.max_transaction_batch {
            return Err(PipelineError::BatchTooLarge {
                len: submitted,
                max: self.limits.max_transaction_batch,
            });
        }

        let now = Utc::now();
        let mut rejected = 0;
        let records: Vec<Transaction> = drafts
            .into_iter()
            .filter(|draft| {
                let ok = draft.amount.is_finite() && draft.amount >= 0.0;
                if !ok {
                    rejected += 1;
                }
                ok
            })
            .map(|draft| Transaction::from_draft(draft, now))
            .collect();
        let validated = records.len();

        let written = if records.is_empty() {
            Ok(0)
        } else {
            store::blocking(&self.store, move |store| store.bulk_insert_transactions(records))
                .await?
        };

        let reduced = reduce(rejected, validated, written);
        if let Some(err) = &reduced.error {
            tracing::error!(error = %err, result = %reduced.result, "transaction bulk insert failed");
        }
        tracing::info!(
            submitted,
            success = reduced.result.success_count,
            fail = reduced.result.fail_count,
            "transaction batch ingested"
        );

        Ok(IngestReport {
            result: reduced.result,
            error: reduced.error,
            peak_in_flight: 0,
        })
    }
}
