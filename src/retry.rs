//! Client-side adaptive retry loop for bulk customer generation.
//!
//! Each iteration generates `remaining` fresh records, submits them in one
//! request and looks at the fail count that comes back:
//!
//! ```text
//! Generating -> Sending -> Evaluating -+-> Succeeded            (fail == 0)
//!     ^                                +-> PersistentlyFailed   (stagnation limit hit)
//!     +---------- Retrying <-----------+   (remaining = fail)
//! ```
//!
//! Only the failed count is regenerated. Generated records are disposable,
//! so failures are retried with *new* records rather than the same payload.
//! An iteration in which every record failed again is stagnant; a run of
//! `stagnation_limit` stagnant iterations ends the loop, and any partial
//! progress resets the run. Transport failures end the loop immediately.
//!
//! The loop is sequential and holds no state outside [`RetryState`]. It is
//! an ordinary future: dropping it (for example when the HTTP caller goes
//! away) cancels the in-flight send.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::RetryConfig;
use crate::record::{BatchResult, CandidateRecord};

/// Produces fresh candidate records.
pub trait RecordSource: Send + Sync {
    fn generate(&self, count: usize) -> Vec<CandidateRecord>;
}

/// Submits a batch to the ingestion endpoint.
#[async_trait]
pub trait IngestSink: Send + Sync {
    async fn submit(&self, batch: Vec<CandidateRecord>) -> Result<BatchResult, TransportError>;
}

/// Failure talking to the ingestion endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("endpoint responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Cumulative time spent per phase across all iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Timings {
    pub generate: Duration,
    pub send: Duration,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    #[error("requested count must be a positive integer")]
    InvalidCount,

    /// `persisted` counts the records earlier attempts got accepted.
    #[error("transport failure on attempt {attempt} after {persisted} persisted: {source}")]
    Transport {
        attempt: u32,
        persisted: usize,
        #[source]
        source: TransportError,
        timings: Timings,
    },

    #[error("endpoint reported {fail_count} failures for a batch of {batch_size}")]
    Protocol {
        attempt: u32,
        batch_size: usize,
        fail_count: usize,
    },

    #[error("persistent failures after {attempts} attempts: {failed} records still failing")]
    PersistentFailure {
        failed: usize,
        attempts: u32,
        timings: Timings,
    },
}

/// What the loop does after evaluating a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeeded,
    Retry { next_batch: usize },
    PersistentlyFailed { failed: usize },
}

/// Mutable state of one top-level generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    remaining: usize,
    stagnation: u32,
    attempts: u32,
    timings: Timings,
}

impl RetryState {
    pub fn new(requested: usize) -> Result<Self, RetryError> {
        if requested == 0 {
            return Err(RetryError::InvalidCount);
        }
        Ok(Self {
            remaining: requested,
            stagnation: 0,
            attempts: 0,
            timings: Timings::default(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn stagnation(&self) -> u32 {
        self.stagnation
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    /// Apply one response to the state.
    pub fn evaluate(&mut self, result: BatchResult, stagnation_limit: u32) -> Result<Step, RetryError> {
        let fail = result.fail_count;
        if fail > self.remaining {
            return Err(RetryError::Protocol {
                attempt: self.attempts,
                batch_size: self.remaining,
                fail_count: fail,
            });
        }
        if result.total() != self.remaining {
            tracing::warn!(
                batch_size = self.remaining,
                success = result.success_count,
                fail,
                "response counts do not add up to the batch size"
            );
        }

        if fail == 0 {
            return Ok(Step::Succeeded);
        }

        if fail == self.remaining {
            self.stagnation += 1;
            tracing::info!(
                fail,
                stagnation = self.stagnation,
                "no progress in this iteration"
            );
            if self.stagnation >= stagnation_limit {
                return Ok(Step::PersistentlyFailed { failed: fail });
            }
        } else {
            if self.stagnation > 0 {
                tracing::debug!("progress made, resetting stagnation counter");
            }
            self.stagnation = 0;
        }

        self.remaining = fail;
        Ok(Step::Retry { next_batch: fail })
    }
}

/// One generate/send round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub batch_size: usize,
    pub result: BatchResult,
}

/// Successful outcome of [`AdaptiveRetryLoop::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryReport {
    pub requested: usize,
    pub attempts: u32,
    pub timings: Timings,
    pub history: Vec<AttemptRecord>,
}

/// Drives generate/send rounds until success or persistent failure.
pub struct AdaptiveRetryLoop<'a, S: ?Sized, K: ?Sized> {
    source: &'a S,
    sink: &'a K,
    config: RetryConfig,
}

impl<'a, S, K> AdaptiveRetryLoop<'a, S, K>
where
    S: RecordSource + ?Sized,
    K: IngestSink + ?Sized,
{
    pub fn new(source: &'a S, sink: &'a K, config: RetryConfig) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    pub async fn run(&self, requested: usize) -> Result<RetryReport, RetryError> {
        let mut state = RetryState::new(requested)?;
        let mut history = Vec::new();

        loop {
            let batch_size = state.remaining;

            let started = Instant::now();
            let batch = self.source.generate(batch_size);
            state.timings.generate += started.elapsed();

            state.attempts += 1;
            tracing::info!(attempt = state.attempts, batch_size, "submitting batch");

            let started = Instant::now();
            let submitted = self.sink.submit(batch).await;
            state.timings.send += started.elapsed();

            let result = submitted.map_err(|source| {
                tracing::error!(attempt = state.attempts, error = %source, "submission failed");
                RetryError::Transport {
                    attempt: state.attempts,
                    persisted: requested - state.remaining,
                    source,
                    timings: state.timings,
                }
            })?;
            history.push(AttemptRecord { batch_size, result });

            tracing::info!(
                attempt = state.attempts,
                success = result.success_count,
                fail = result.fail_count,
                "batch evaluated"
            );

            match state.evaluate(result, self.config.stagnation_limit)? {
                Step::Succeeded => {
                    return Ok(RetryReport {
                        requested,
                        attempts: state.attempts,
                        timings: state.timings,
                        history,
                    });
                }
                Step::PersistentlyFailed { failed } => {
                    tracing::warn!(failed, attempts = state.attempts, "persistent failures, stopping retries");
                    return Err(RetryError::PersistentFailure {
                        failed,
                        attempts: state.attempts,
                        timings: state.timings,
                    });
                }
                Step::Retry { .. } => {}
            }
        }
    }
}
