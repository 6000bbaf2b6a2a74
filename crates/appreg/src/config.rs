//! Application registry configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [secrets]
//! memory_cost_kib = 19456
//! iterations = 2
//! parallelism = 1
//! generated_secret_bytes = 32
//! ```

use serde::{Deserialize, Serialize};

/// Root registry configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Client secret hashing and generation.
    pub secrets: SecretConfig,
}

/// Client secret configuration.
///
/// Controls the Argon2id cost parameters used to obfuscate secrets and the
/// size of generated secrets. Existing hashes keep verifying after a change:
/// the parameters are read back from each stored hash.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretConfig {
    /// Argon2 memory cost in KiB.
    pub memory_cost_kib: u32,

    /// Argon2 iteration count (time cost).
    pub iterations: u32,

    /// Argon2 degree of parallelism.
    pub parallelism: u32,

    /// Number of random bytes in generated secrets.
    pub generated_secret_bytes: usize,
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
            generated_secret_bytes: 32,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl RegistryConfig {
    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::InvalidValue` if validation fails.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The iteration count or parallelism is zero
    /// - The memory cost is below 8 KiB per lane
    /// - Generated secrets would be shorter than 16 bytes
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secrets = &self.secrets;

        if secrets.iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "secrets.iterations must be > 0".to_string(),
            ));
        }

        if secrets.parallelism == 0 {
            return Err(ConfigError::InvalidValue(
                "secrets.parallelism must be > 0".to_string(),
            ));
        }

        if secrets.memory_cost_kib < 8 * secrets.parallelism {
            return Err(ConfigError::InvalidValue(format!(
                "secrets.memory_cost_kib must be at least {} for parallelism {}",
                8 * secrets.parallelism,
                secrets.parallelism
            )));
        }

        if secrets.generated_secret_bytes < 16 {
            return Err(ConfigError::InvalidValue(
                "secrets.generated_secret_bytes must be >= 16".to_string(),
            ));
        }

        Ok(())
    }
}
