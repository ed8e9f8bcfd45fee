//! Password hashing behind the `CredentialHasher` seam.
//!
//! The default implementation stores bcrypt modular-crypt strings
//! (`$2b$<cost>$<salt+digest>`); the cost and salt travel inside the hash.

use crate::auth::AuthError;

/// Lowest and highest cost factors bcrypt accepts.
const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Hashes and verifies passwords.
pub trait CredentialHasher {
    /// Returns an encoded hash with a fresh random salt.
    fn hash(&self, plain: &str) -> Result<String, AuthError>;
    /// Returns whether `plain` matches `encoded`. Malformed input is `false`.
    fn verify(&self, plain: &str, encoded: &str) -> bool;
}

/// Default `CredentialHasher`, backed by the `bcrypt` crate.
#[derive(Debug, Clone, Copy)]
pub struct BcryptCredentialHasher {
    cost: u32,
}

impl Default for BcryptCredentialHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl BcryptCredentialHasher {
    /// Uses a custom cost factor, clamped to bcrypt's accepted range.
    /// Tests use the minimum.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl CredentialHasher for BcryptCredentialHasher {
    fn hash(&self, plain: &str) -> Result<String, AuthError> {
        bcrypt::hash(plain, self.cost).map_err(|err| AuthError::Hashing(err.to_string()))
    }

    fn verify(&self, plain: &str, encoded: &str) -> bool {
        bcrypt::verify(plain, encoded).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::{BcryptCredentialHasher, CredentialHasher, MIN_COST};

    fn hasher() -> BcryptCredentialHasher {
        BcryptCredentialHasher::with_cost(MIN_COST)
    }

    #[test]
    fn hash_then_verify_accepts_only_the_same_password() {
        let encoded = hasher().hash("pw1").unwrap();
        assert!(encoded.starts_with("$2b$04$"));
        assert!(hasher().verify("pw1", &encoded));
        assert!(!hasher().verify("pw2", &encoded));
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(hasher().hash("pw").unwrap(), hasher().hash("pw").unwrap());
    }

    #[test]
    fn verify_uses_cost_recorded_in_hash() {
        let encoded = hasher().hash("pw").unwrap();
        assert!(BcryptCredentialHasher::with_cost(10).verify("pw", &encoded));
    }

    #[test]
    fn cost_is_clamped_to_bcrypt_range() {
        assert_eq!(BcryptCredentialHasher::with_cost(1).cost(), MIN_COST);
        assert_eq!(BcryptCredentialHasher::with_cost(99).cost(), 31);
    }

    #[test]
    fn non_ascii_passwords_round_trip() {
        let encoded = hasher().hash("密碼-pässwörd").unwrap();
        assert!(hasher().verify("密碼-pässwörd", &encoded));
        assert!(!hasher().verify("密碼-passwörd", &encoded));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        for encoded in ["", "$2b$", "sha256$1$00$00", "$2b$04$tooshort", "plain-text"] {
            assert!(!hasher().verify("pw", encoded), "{encoded} should not verify");
        }
    }
}
