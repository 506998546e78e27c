//! Password hashing and generated credentials
//!
//! Hashes are Argon2id PHC strings. Invitees who have never registered get
//! a random generated password until they set their own on acceptance.

use crate::error::{AuthError, AuthResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use rand::Rng;

/// Characters used for generated passwords. Excludes `0` to avoid
/// confusion with `O`.
pub const PASSWORD_ALPHABET: &str = "123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of generated placeholder passwords.
pub const GENERATED_PASSWORD_LEN: usize = 8;

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password.
    fn hash(&self, password: &str) -> AuthResult<String>;

    /// Check a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> AuthResult<bool>;
}

/// Argon2id hasher.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Default for Argon2Hasher {
    /// Production parameters (19 MiB, 2 iterations, 1 lane).
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl Argon2Hasher {
    /// Hasher with explicit cost parameters. Low-cost settings are only
    /// meant for tests.
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> AuthResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AuthError::ConfigError(format!("Invalid Argon2 params: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }
}

/// Random password drawn from [`PASSWORD_ALPHABET`].
pub fn generate_password(len: usize) -> String {
    let alphabet = PASSWORD_ALPHABET.as_bytes();
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("s3cret!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("s3cret!", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        let hasher = fast_hasher();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        let result = fast_hasher().verify("x", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            Argon2Hasher::with_params(1, 1, 1),
            Err(AuthError::ConfigError(_))
        ));
    }

    #[test]
    fn test_generated_password() {
        let password = generate_password(GENERATED_PASSWORD_LEN);
        assert_eq!(password.len(), GENERATED_PASSWORD_LEN);
        assert!(password.chars().all(|c| PASSWORD_ALPHABET.contains(c)));
        assert!(!password.contains('0'));
    }
}
