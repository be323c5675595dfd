//! Synthetic customers and transactions.
//!
//! Customers are cheap and disposable: a hex name from 4 random bytes, a hex
//! secret from 8 random bytes (16 characters, always long enough to pass
//! validation), an address built from the name and one of a fixed set of
//! domains. Collisions on the address are possible and are exactly what the
//! adaptive retry loop absorbs.

use chrono::{DateTime, Duration, Months, Utc};
use rayon::prelude::*;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::record::{CandidateRecord, Gender, TransactionDraft};
use crate::retry::RecordSource;

pub const EMAIL_DOMAINS: [&str; 10] = [
    "@gmail.com",
    "@yahoo.com.tw",
    "@outlook.com",
    "@icloud.com",
    "@hotmail.com",
    "@aol.com",
    "@mail.com",
    "@yandex.com",
    "@protonmail.com",
    "@gmx.com",
];

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    bytes.iter_mut().for_each(|b| *b = fastrand::u8(..));
    hex::encode(bytes)
}

/// Generates random [`CandidateRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerFactory;

impl CustomerFactory {
    pub fn candidate(&self) -> CandidateRecord {
        let name = random_hex(4);
        let domain = EMAIL_DOMAINS[fastrand::usize(..EMAIL_DOMAINS.len())];
        CandidateRecord {
            email: format!("{name}{domain}"),
            name,
            password: random_hex(8),
            gender: Gender::ALL[fastrand::usize(..Gender::ALL.len())],
        }
    }
}

impl RecordSource for CustomerFactory {
    fn generate(&self, count: usize) -> Vec<CandidateRecord> {
        tracing::debug!(count, "generating customers");
        (0..count).map(|_| self.candidate()).collect()
    }
}

/// Generates transaction drafts against a pool of existing customers.
#[derive(Debug, Clone, Copy)]
pub struct TransactionFactory {
    window_months: u32,
    max_amount: f64,
}

impl Default for TransactionFactory {
    fn default() -> Self {
        Self {
            window_months: 18,
            max_amount: 1_000_000.0,
        }
    }
}

impl TransactionFactory {
    pub fn with_window_months(mut self, months: u32) -> Self {
        self.window_months = months.max(1);
        self
    }

    pub fn with_max_amount(mut self, max_amount: f64) -> Self {
        self.max_amount = max_amount;
        self
    }

    /// `count` drafts with a customer drawn uniformly from `pool`, an amount
    /// in `[0, max_amount)` and a whole-second time in the window ending at
    /// `now`. Drafts are built in parallel; order carries no meaning.
    pub fn generate(
        &self,
        count: usize,
        pool: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<TransactionDraft>, PipelineError> {
        if pool.is_empty() {
            return Err(PipelineError::EmptyCustomerPool);
        }
        let start = now
            .checked_sub_months(Months::new(self.window_months))
            .ok_or_else(|| PipelineError::InvalidInput("time window out of range".into()))?;
        let span = (now.timestamp() - start.timestamp()).max(1);
        let max_amount = self.max_amount;

        let drafts = (0..count)
            .into_par_iter()
            .map(|_| TransactionDraft {
                customer_id: pool[fastrand::usize(..pool.len())],
                amount: fastrand::f64() * max_amount,
                time: start + Duration::seconds(fastrand::i64(0..span)),
            })
            .collect();
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::validate::RecordValidator;

    #[test]
    fn candidates_pass_default_validation() {
        let validator = RecordValidator::from_config(&PipelineConfig::default());
        let factory = CustomerFactory;
        for candidate in factory.generate(200) {
            assert_eq!(candidate.name.len(), 8);
            assert_eq!(candidate.password.len(), 16);
            assert!(candidate.email.starts_with(&candidate.name));
            assert!(EMAIL_DOMAINS.iter().any(|d| candidate.email.ends_with(d)));
            validator.validate(&candidate).unwrap();
        }
    }

    #[test]
    fn empty_pool_is_an_input_error() {
        let err = TransactionFactory::default()
            .generate(10, &[], Utc::now())
            .unwrap_err();
        assert_eq!(err, PipelineError::EmptyCustomerPool);
    }

    #[test]
    fn drafts_stay_in_bounds() {
        let pool: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let now = Utc::now();
        let start = now.checked_sub_months(Months::new(18)).unwrap();

        let drafts = TransactionFactory::default()
            .generate(1000, &pool, now)
            .unwrap();
        assert_eq!(drafts.len(), 1000);
        for d in &drafts {
            assert!(pool.contains(&d.customer_id));
            assert!((0.0..1_000_000.0).contains(&d.amount));
            assert!(d.time >= start && d.time <= now);
        }
    }
}
