use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// One-way credential hashing.
///
/// Used for both stored passwords and persisted refresh-token digests.
/// Internally Argon2id with a fresh random salt per call; the salt travels
/// inside the PHC digest string, so callers never manage salt state.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext secret.
    ///
    /// # Returns
    /// PHC string format digest (algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - the underlying primitive faulted
    pub fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a secret against a stored digest.
    ///
    /// Comparison is constant-time via the algorithm's own verifier. A
    /// malformed digest yields `Ok(false)` rather than an error so that a
    /// corrupted stored value can never distinguish itself from a wrong
    /// secret. An empty digest is a programmer error and fails loudly.
    ///
    /// # Errors
    /// * `EmptyDigest` - the stored digest is empty
    pub fn compare(&self, secret: &str, digest: &str) -> Result<bool, PasswordError> {
        if digest.is_empty() {
            return Err(PasswordError::EmptyDigest);
        }

        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(false),
        };

        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
