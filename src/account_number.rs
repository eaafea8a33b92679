use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::repository::{BackupRepository, RegisterOutcome};
use crate::util::key_prefix;

pub const ACCOUNT_NUMBER_LEN: usize = 24;

/// Collision retries are bounded so a broken registry cannot spin the
/// handler forever. With a 24-digit space the bound is unreachable.
const MAX_GENERATE_ATTEMPTS: u32 = 64;

const DIGITS: &[u8] = b"0123456789";

/// One-way hash of the secret account number; the only identity form that
/// ever reaches storage. Unsalted: the same secret must resolve to the same
/// key on every lookup.
pub fn hash_account_number(account_number: &str) -> String {
    hex::encode(Sha256::digest(account_number.as_bytes()))
}

/// Account numbers are exactly 24 ASCII decimal digits.
pub fn is_valid_account_number(s: &str) -> bool {
    s.len() == ACCOUNT_NUMBER_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

/// Each digit is an independent uniform draw from the alphabet, so there is
/// no modulo bias from mapping a wide integer down.
fn random_account_number() -> String {
    let mut rng = rand::thread_rng();
    (0..ACCOUNT_NUMBER_LEN)
        .map(|_| DIGITS[rng.gen_range(0..DIGITS.len())] as char)
        .collect()
}

/// Draw a fresh secret account number and register its hash, as one
/// request-scoped operation. The registry's uniqueness constraint is the
/// collision guard: an already-registered hash discards the candidate and
/// draws again. A candidate whose registration fails is never returned.
pub async fn generate_account_number(
    repo: &dyn BackupRepository,
) -> Result<String, AppError> {
    for _ in 0..MAX_GENERATE_ATTEMPTS {
        let candidate = random_account_number();
        let identity_key = hash_account_number(&candidate);

        match repo.register_account(&identity_key).await? {
            RegisterOutcome::Registered => return Ok(candidate),
            RegisterOutcome::AlreadyExists => {
                tracing::warn!(
                    identity_key = %key_prefix(&identity_key),
                    "Account number collision, drawing a new candidate"
                );
            }
        }
    }

    tracing::error!(
        attempts = MAX_GENERATE_ATTEMPTS,
        "Account number generation exhausted its retry bound"
    );
    Err(AppError::Internal(
        "account number generation exhausted".into(),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::backup::{BackupMode, BackupRow};

    #[test]
    fn test_hash_is_deterministic() {
        let a = hash_account_number("123456789012345678901234");
        let b = hash_account_number("123456789012345678901234");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_distinguishes_inputs() {
        let a = hash_account_number("123456789012345678901234");
        let b = hash_account_number("123456789012345678901235");
        assert_ne!(a, b);
    }

    #[test]
    fn test_valid_account_number() {
        assert!(is_valid_account_number("123456789012345678901234"));
    }

    #[test]
    fn test_invalid_account_numbers() {
        assert!(!is_valid_account_number(""));
        assert!(!is_valid_account_number("12345678901234567890123"));
        assert!(!is_valid_account_number("1234567890123456789012345"));
        assert!(!is_valid_account_number("12345678901234567890123a"));
        assert!(!is_valid_account_number("12345678901234567890123 "));
    }

    #[test]
    fn test_random_number_shape() {
        for _ in 0..32 {
            assert!(is_valid_account_number(&random_account_number()));
        }
    }

    /// Registry stub that reports a collision on the first registration
    /// attempt, to drive the generator's retry path.
    struct CollidingRegistry {
        calls: AtomicU32,
    }

    #[async_trait]
    impl BackupRepository for CollidingRegistry {
        async fn register_account(&self, _key: &str) -> Result<RegisterOutcome, AppError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(RegisterOutcome::AlreadyExists)
            } else {
                Ok(RegisterOutcome::Registered)
            }
        }

        async fn account_exists(&self, _key: &str) -> Result<bool, AppError> {
            unimplemented!()
        }

        async fn replace_backup(
            &self,
            _key: &str,
            _payload: &str,
            _mode: BackupMode,
        ) -> Result<(), AppError> {
            unimplemented!()
        }

        async fn latest_backup(&self, _key: &str) -> Result<Option<BackupRow>, AppError> {
            unimplemented!()
        }

        async fn update_backup_payload(
            &self,
            _key: &str,
            _payload: &str,
        ) -> Result<(), AppError> {
            unimplemented!()
        }

        async fn delete_backup(&self, _key: &str) -> Result<bool, AppError> {
            unimplemented!()
        }

        async fn admit_rate_event(
            &self,
            _client_addr: &str,
            _endpoint: &str,
            _now: i64,
            _window_start: i64,
            _max_requests: i64,
        ) -> Result<bool, AppError> {
            unimplemented!()
        }

        async fn health_check(&self) -> Result<(), AppError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_generator_retries_on_collision() {
        let registry = CollidingRegistry {
            calls: AtomicU32::new(0),
        };
        let number = generate_account_number(&registry)
            .await
            .expect("second candidate should register");
        assert!(is_valid_account_number(&number));
        assert_eq!(registry.calls.load(Ordering::SeqCst), 2);
    }
}
