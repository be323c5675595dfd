//! Salted one-way derivation of customer secrets.
//!
//! Secrets are run through scrypt with the process-wide salt and stored as
//! standard base64, so equal secrets always map to equal text and can be
//! compared in the store.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::PipelineConfig;
use crate::error::DerivationError;

/// Derives the stored form of a secret. Cheap to clone.
#[derive(Clone)]
pub struct KeyDeriver {
    salt: Arc<[u8]>,
    log_n: u8,
    r: u32,
    p: u32,
    len: usize,
}

impl std::fmt::Debug for KeyDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyDeriver")
            .field("log_n", &self.log_n)
            .field("r", &self.r)
            .field("p", &self.p)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl KeyDeriver {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            salt: Arc::from(config.salt.as_bytes()),
            log_n: config.scrypt_log_n,
            r: config.scrypt_r,
            p: config.scrypt_p,
            len: config.derived_key_len,
        }
    }

    /// Derive the base64 stored form of `secret`.
    ///
    /// Parameter problems surface here rather than at construction so that a
    /// misconfigured deriver fails records one by one instead of the batch.
    pub fn derive(&self, secret: &str) -> Result<String, DerivationError> {
        let params = scrypt::Params::new(self.log_n, self.r, self.p, self.len)
            .map_err(|e| DerivationError::InvalidParams(e.to_string()))?;

        let mut key = vec![0u8; self.len];
        scrypt::scrypt(secret.as_bytes(), &self.salt, &params, &mut key)
            .map_err(|_| DerivationError::InvalidOutputLen(self.len))?;

        Ok(STANDARD.encode(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deriver(salt: &str) -> KeyDeriver {
        KeyDeriver::new(&PipelineConfig::default().with_salt(salt))
    }

    #[test]
    fn derivation_is_deterministic() {
        let d = deriver("pepper");
        let a = d.derive("correct horse").unwrap();
        let b = d.derive("correct horse").unwrap();
        assert_eq!(a, b);
        // 32 bytes -> 44 base64 characters
        assert_eq!(a.len(), 44);
    }

    #[test]
    fn different_secrets_differ() {
        let d = deriver("pepper");
        assert_ne!(d.derive("password1").unwrap(), d.derive("password2").unwrap());
    }

    #[test]
    fn salt_changes_output() {
        let a = deriver("salt-a").derive("same secret").unwrap();
        let b = deriver("salt-b").derive("same secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn bad_params_are_reported() {
        let mut cfg = PipelineConfig::default();
        cfg.scrypt_r = 0;
        let err = KeyDeriver::new(&cfg).derive("whatever1").unwrap_err();
        assert!(matches!(err, DerivationError::InvalidParams(_)));
    }
}
