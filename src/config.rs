//! Pipeline configuration.
//!
//! Both structs are read once at process start (the services deserialize them
//! out of their own config tree) and then shared immutably. Business logic
//! never reads ambient state; every component receives its config at
//! construction.
//!
//! ```toml
//! [pipeline]
//! salt = "change-me"
//! max_workers = 2
//! min_secret_len = 8
//! scrypt_log_n = 10
//! scrypt_r = 8
//! scrypt_p = 1
//! derived_key_len = 32
//! insert_chunk_size = 100
//!
//! [retry]
//! stagnation_limit = 5
//! ```

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration of the server-side ingestion stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Process-wide salt for secret derivation.
    #[serde(default = "default_salt")]
    pub salt: String,

    /// Upper bound on concurrently processed records. The effective pool is
    /// `min(available_parallelism, max_workers)`.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Minimum secret length in characters.
    #[serde(default = "default_min_secret_len")]
    pub min_secret_len: usize,

    /// log2 of the scrypt cost parameter N.
    #[serde(default = "default_scrypt_log_n")]
    pub scrypt_log_n: u8,

    #[serde(default = "default_scrypt_r")]
    pub scrypt_r: u32,

    #[serde(default = "default_scrypt_p")]
    pub scrypt_p: u32,

    /// Derived key length in bytes (before base64).
    #[serde(default = "default_derived_key_len")]
    pub derived_key_len: usize,

    /// Rows per storage write transaction during bulk inserts.
    #[serde(default = "default_insert_chunk_size")]
    pub insert_chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            salt: default_salt(),
            max_workers: default_max_workers(),
            min_secret_len: default_min_secret_len(),
            scrypt_log_n: default_scrypt_log_n(),
            scrypt_r: default_scrypt_r(),
            scrypt_p: default_scrypt_p(),
            derived_key_len: default_derived_key_len(),
            insert_chunk_size: default_insert_chunk_size(),
        }
    }
}

impl PipelineConfig {
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Number of records processed at once.
    pub fn worker_count(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        cores.min(self.max_workers).max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be positive".into()));
        }
        if self.insert_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "insert_chunk_size must be positive".into(),
            ));
        }
        if self.salt.is_empty() {
            tracing::warn!("pipeline salt is empty; derived secrets are unsalted");
        }
        Ok(())
    }
}

/// Configuration of the client-side adaptive retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Consecutive zero-progress iterations tolerated before giving up.
    #[serde(default = "default_stagnation_limit")]
    pub stagnation_limit: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            stagnation_limit: default_stagnation_limit(),
        }
    }
}

impl RetryConfig {
    pub fn with_stagnation_limit(mut self, limit: u32) -> Self {
        self.stagnation_limit = limit;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stagnation_limit == 0 {
            return Err(ConfigError::Invalid(
                "stagnation_limit must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_salt() -> String {
    "default_salt_value".to_string()
}

fn default_max_workers() -> usize {
    2
}

fn default_min_secret_len() -> usize {
    8
}

fn default_scrypt_log_n() -> u8 {
    10
}

fn default_scrypt_r() -> u32 {
    8
}

fn default_scrypt_p() -> u32 {
    1
}

fn default_derived_key_len() -> usize {
    32
}

fn default_insert_chunk_size() -> usize {
    100
}

fn default_stagnation_limit() -> u32 {
    5
}
