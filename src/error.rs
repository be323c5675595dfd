//! Error types produced by the ingestion pipeline.
//!
//! Errors are split by blast radius:
//!
//! | Error | Scope | Handling |
//! |-------|-------|----------|
//! | [`Rejection`] | one record | counted as a failure, never escalated |
//! | [`DerivationError`] | one record | wrapped in a [`Rejection`], logged at `warn` |
//! | [`StoreError`] | one batch | surfaced with the best-known counts |
//! | [`PipelineError`] | one request | rejected before or after processing |
//!
//! Duplicate-key collisions never appear here: the store skips them and the
//! reducer folds them into the fail count.

use thiserror::Error;

use crate::record::BatchResult;

/// Why a single candidate record did not make it into the validated set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Rejection {
    #[error("secret too short: {actual} characters, minimum is {min}")]
    SecretTooShort { min: usize, actual: usize },

    #[error("invalid contact address: {0:?}")]
    InvalidContact(String),

    #[error("name must not be empty")]
    EmptyName,

    #[error("secret derivation failed: {0}")]
    Derivation(#[from] DerivationError),

    /// The worker processing the record panicked or was cancelled.
    #[error("worker aborted: {0}")]
    Aborted(String),
}

/// Failure of the key-derivation primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("invalid scrypt parameters: {0}")]
    InvalidParams(String),

    #[error("invalid derived key length: {0}")]
    InvalidOutputLen(usize),
}

/// Errors raised by a [`Store`](crate::store::Store) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("corrupt stored row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}

/// A bulk insert that failed part way.
///
/// `rows_written` is the number of rows committed before `error` occurred and
/// is what the reducer trusts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("bulk insert failed after {rows_written} rows: {error}")]
pub struct PartialInsert {
    pub rows_written: usize,
    #[source]
    pub error: StoreError,
}

impl PartialInsert {
    pub fn new(rows_written: usize, error: StoreError) -> Self {
        Self {
            rows_written,
            error,
        }
    }
}

/// Request-level failures of the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PipelineError {
    #[error("batch of {len} records exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("customer pool is empty")]
    EmptyCustomerPool,

    /// Persistence failed hard; `result` still carries the reconciled counts.
    #[error("persistence failed ({result}): {source}")]
    Persistence {
        result: BatchResult,
        #[source]
        source: StoreError,
    },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("admission gate closed")]
    GateClosed,

    #[error("background task failed: {0}")]
    Task(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
