//! Structural validation of candidate records.
//!
//! A [`RecordValidator`] runs an ordered list of [`ValidationRule`]s and stops
//! at the first failure. Rejections are ordinary values; they are counted by
//! the caller and never abort a batch.

use crate::config::PipelineConfig;
use crate::error::Rejection;
use crate::record::CandidateRecord;

/// A single structural check.
pub trait ValidationRule: Send + Sync {
    fn check(&self, record: &CandidateRecord) -> Result<(), Rejection>;
}

/// Secret must be at least `min` characters long.
#[derive(Debug, Clone, Copy)]
pub struct MinSecretLength {
    pub min: usize,
}

impl ValidationRule for MinSecretLength {
    fn check(&self, record: &CandidateRecord) -> Result<(), Rejection> {
        let actual = record.password.chars().count();
        if actual < self.min {
            return Err(Rejection::SecretTooShort {
                min: self.min,
                actual,
            });
        }
        Ok(())
    }
}

/// Contact must look like `local@domain`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactFormat;

impl ValidationRule for ContactFormat {
    fn check(&self, record: &CandidateRecord) -> Result<(), Rejection> {
        let email = record.email.trim();
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        };
        if !valid {
            return Err(Rejection::InvalidContact(record.email.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmptyName;

impl ValidationRule for NonEmptyName {
    fn check(&self, record: &CandidateRecord) -> Result<(), Rejection> {
        if record.name.trim().is_empty() {
            return Err(Rejection::EmptyName);
        }
        Ok(())
    }
}

/// Ordered set of rules applied to every candidate.
pub struct RecordValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl RecordValidator {
    /// Validator with no rules; accepts everything.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The standard rule set: secret length first, then contact and name.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::empty()
            .with_rule(MinSecretLength {
                min: config.min_secret_len,
            })
            .with_rule(ContactFormat)
            .with_rule(NonEmptyName)
    }

    pub fn with_rule(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn validate(&self, record: &CandidateRecord) -> Result<(), Rejection> {
        self.rules.iter().try_for_each(|rule| rule.check(record))
    }
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
