//! Record types flowing through the ingestion pipeline.
//!
//! A [`CandidateRecord`] arrives over the wire, the batch processor turns it
//! into either a [`ValidatedRecord`] or a rejection ([`IngestionOutcome`]),
//! and the reducer reports a [`BatchResult`] back to the caller.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Rejection;

/// Customer category. Serialized in lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];
}

/// An unvalidated customer proposed for ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    /// Plaintext secret. Never persisted.
    pub password: String,
    /// Must be unique across all persisted customers.
    pub email: String,
    pub gender: Gender,
}

/// A candidate that passed validation, got an identity and had its secret
/// replaced by the derived form.
///
/// Fields are private so a validated record cannot be altered after the
/// processor produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    id: Uuid,
    name: String,
    password_hash: String,
    email: String,
    gender: Gender,
}

impl ValidatedRecord {
    pub fn new(id: Uuid, candidate: CandidateRecord, password_hash: String) -> Self {
        Self {
            id,
            name: candidate.name,
            password_hash,
            email: candidate.email,
            gender: candidate.gender,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    /// Public view of the record, without the derived secret.
    pub fn summary(&self) -> CustomerSummary {
        CustomerSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            gender: self.gender,
        }
    }
}

/// A persisted customer as returned by listing queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub gender: Gender,
}

/// Customer listing row enriched with the trailing-window transaction total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerReport {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub total_transaction_amount: f64,
}

/// Per-record result of the batch processor. Produced exactly once per
/// candidate and consumed exactly once by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    Accepted(ValidatedRecord),
    Rejected(Rejection),
}

/// Aggregate counts reported for one ingested batch.
///
/// `success_count + fail_count` equals the size of the submitted batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success_count: usize,
    pub fail_count: usize,
}

impl BatchResult {
    pub fn new(success_count: usize, fail_count: usize) -> Self {
        Self {
            success_count,
            fail_count,
        }
    }

    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "success={} fail={}", self.success_count, self.fail_count)
    }
}

/// A transaction as produced by the generator, before it has an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub customer_id: Uuid,
    pub amount: f64,
    pub time: DateTime<Utc>,
}

/// A persisted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: f64,
    pub time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn from_draft(draft: TransactionDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: draft.customer_id,
            amount: draft.amount,
            time: draft.time,
            created_at,
        }
    }
}
