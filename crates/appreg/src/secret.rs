//! Client secret generation, obfuscation and verification.
//!
//! Secrets are never stored in plaintext. The [`SecretCodec`] hashes them with
//! a pluggable [`SecretHasher`] (Argon2id by default) and verifies presented
//! secrets against the stored hash. Verification never fails loudly: a
//! malformed stored hash is logged and reported as a mismatch.
//!
//! # Security
//!
//! - Generated secrets are random bytes, hex-encoded, with an `app_` prefix
//! - Hashing uses Argon2id with a random salt per secret (OsRng)
//! - Hashes are stored in PHC string format, so verification reads the
//!   parameters back from the hash itself
//!
//! # Example
//!
//! ```
//! use appreg::secret::{Argon2SecretHasher, SecretHasher, generate_client_secret};
//!
//! let secret = generate_client_secret(32);
//! assert!(secret.starts_with("app_"));
//!
//! let hasher = Argon2SecretHasher::default();
//! let hash = hasher.hash(&secret).unwrap();
//! assert!(hasher.verify(&hash, &secret).unwrap());
//! ```

use std::fmt;
use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;

use crate::config::SecretConfig;
use crate::{AppError, AppResult};

/// Prefix of generated client secrets.
pub const GENERATED_SECRET_PREFIX: &str = "app_";

/// Generate a new cryptographically secure client secret.
///
/// The secret is `len` random bytes encoded as hexadecimal with an `app_`
/// prefix, so its length is `4 + 2 * len` characters.
#[must_use]
pub fn generate_client_secret(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{GENERATED_SECRET_PREFIX}{}", hex::encode(bytes))
}

// =============================================================================
// Secret Hasher
// =============================================================================

/// Errors raised by a hashing primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    /// The secret could not be hashed.
    #[error("Failed to hash secret: {0}")]
    Hash(String),

    /// The stored hash could not be parsed.
    #[error("Malformed secret hash: {0}")]
    MalformedHash(String),
}

/// One-way hashing primitive used to obfuscate client secrets.
pub trait SecretHasher: Send + Sync {
    /// Hash a plaintext secret for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the primitive fails.
    fn hash(&self, plaintext: &str) -> Result<String, SecretError>;

    /// Verify a plaintext secret against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored hash is malformed.
    fn verify(&self, hash: &str, plaintext: &str) -> Result<bool, SecretError>;
}

/// Argon2id secret hasher.
#[derive(Debug, Clone)]
pub struct Argon2SecretHasher {
    params: Params,
}

impl Argon2SecretHasher {
    /// Creates a hasher with explicit Argon2 parameters.
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Creates a hasher from the secrets configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if Argon2 rejects the configured costs.
    pub fn from_config(config: &SecretConfig) -> Result<Self, SecretError> {
        let params = Params::new(
            config.memory_cost_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| SecretError::Hash(e.to_string()))?;
        Ok(Self::new(params))
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2SecretHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl SecretHasher for Argon2SecretHasher {
    fn hash(&self, plaintext: &str) -> Result<String, SecretError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| SecretError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, hash: &str, plaintext: &str) -> Result<bool, SecretError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| SecretError::MalformedHash(e.to_string()))?;
        let result = self
            .argon2()
            .verify_password(plaintext.as_bytes(), &parsed_hash);
        Ok(result.is_ok())
    }
}

// =============================================================================
// Secret Codec
// =============================================================================

/// Obfuscates and verifies client secrets.
///
/// Hashing is CPU-bound, so both operations run on the blocking thread pool.
#[derive(Clone)]
pub struct SecretCodec {
    hasher: Arc<dyn SecretHasher>,
}

impl SecretCodec {
    /// Creates a codec around the given hashing primitive.
    #[must_use]
    pub fn new(hasher: Arc<dyn SecretHasher>) -> Self {
        Self { hasher }
    }

    /// Obfuscate a plaintext secret for storage.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Precondition` if `plaintext` is empty and
    /// `AppError::Internal` if the primitive fails.
    pub async fn obfuscate(&self, plaintext: &str) -> AppResult<String> {
        if plaintext.is_empty() {
            return Err(AppError::precondition("The secret cannot be null or empty."));
        }

        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AppError::internal(format!("Secret hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(e.to_string()))
    }

    /// Verify a plaintext secret against a stored hash.
    ///
    /// A malformed hash is logged and reported as `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Precondition` if either argument is empty.
    pub async fn verify(&self, plaintext: &str, hash: &str) -> AppResult<bool> {
        if plaintext.is_empty() {
            return Err(AppError::precondition("The secret cannot be null or empty."));
        }
        if hash.is_empty() {
            return Err(AppError::precondition(
                "The comparand cannot be null or empty.",
            ));
        }

        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || hasher.verify(&hash, &plaintext)).await;

        match outcome {
            Ok(Ok(matches)) => Ok(matches),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Stored client secret hash could not be verified");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Client secret verification task failed");
                Ok(false)
            }
        }
    }
}

impl Default for SecretCodec {
    fn default() -> Self {
        Self::new(Arc::new(Argon2SecretHasher::default()))
    }
}

impl fmt::Debug for SecretCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCodec").finish_non_exhaustive()
    }
}
