//! # appreg
//!
//! Client application registry for OAuth 2.0 / OpenID Connect servers.
//!
//! This crate provides:
//! - Application records and descriptors with typed redirect URIs
//! - Permission entailment across endpoints, grant types and scopes
//! - Record validation reporting every violation
//! - Client secret generation, Argon2id obfuscation and verification
//! - An [`ApplicationManager`] orchestrating a pluggable [`ApplicationStore`]
//!
//! ## Modules
//!
//! - [`config`] - Secret hashing configuration
//! - [`error`] - Error types and categories
//! - [`manager`] - Application lifecycle and client authentication checks
//! - [`permissions`] - Permission constants and entailment rules
//! - [`secret`] - Client secret generation and hashing
//! - [`storage`] - Storage trait for application records
//! - [`types`] - Records, descriptors and absolute URIs
//! - [`validation`] - Validation rules and violations

pub mod config;
pub mod error;
pub mod manager;
pub mod permissions;
pub mod secret;
pub mod storage;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, RegistryConfig, SecretConfig};
pub use error::{AppError, ErrorCategory};
pub use manager::ApplicationManager;
pub use permissions::{DefaultPermissionEvaluator, PermissionEvaluator};
pub use secret::{
    Argon2SecretHasher, GENERATED_SECRET_PREFIX, SecretCodec, SecretError, SecretHasher,
    generate_client_secret,
};
pub use storage::{ApplicationFilter, ApplicationStore};
pub use types::{
    AbsoluteUri, ApplicationDescriptor, ApplicationRecord, ClientType, UnknownClientType,
    consent_types,
};
pub use validation::{ApplicationValidator, DefaultApplicationValidator, Violation};

/// Type alias for registry results.
pub type AppResult<T> = Result<T, AppError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use appreg::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AppResult;
    pub use crate::config::{ConfigError, RegistryConfig, SecretConfig};
    pub use crate::error::{AppError, ErrorCategory};
    pub use crate::manager::ApplicationManager;
    pub use crate::permissions::{endpoints, grant_types, prefixes, scopes};
    pub use crate::secret::generate_client_secret;
    pub use crate::storage::{ApplicationFilter, ApplicationStore};
    pub use crate::types::{
        AbsoluteUri, ApplicationDescriptor, ApplicationRecord, ClientType, consent_types,
    };
    pub use crate::validation::Violation;
}
