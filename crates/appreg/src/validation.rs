//! Application validation.
//!
//! The validator reports every inconsistency of a candidate record as a
//! [`Violation`]. Violations are data: the validator only fails when the store
//! lookup behind the uniqueness check fails.
//!
//! Rules, in reporting order:
//!
//! 1. the client identifier is present and not used by another application
//! 2. the client type is known and agrees with the presence of a secret
//! 3. every post-logout redirect URI, then every redirect URI, is a non-empty
//!    absolute URI without fragment (only the first offending address is
//!    reported)
//! 4. grant type permissions have their prerequisite endpoint permissions,
//!    checked only once the record declares an endpoint allow-list

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::permissions::{PermissionSet, endpoints, grant_types, prefixes};
use crate::storage::ApplicationStore;
use crate::types::{AbsoluteUri, ApplicationRecord, ClientType};
use crate::{AppError, AppResult};

// =============================================================================
// Violation
// =============================================================================

/// A single inconsistency reported by the validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// The client identifier is missing.
    #[error("The client identifier cannot be null or empty.")]
    EmptyClientId,

    /// Another application uses the same client identifier.
    #[error("An application with the same client identifier already exists.")]
    DuplicateClientId,

    /// The client type is missing.
    #[error("The client type cannot be null or empty.")]
    EmptyClientType,

    /// The client type is not one of the known values.
    #[error("The specified client type '{0}' is not valid.")]
    InvalidClientType(String),

    /// A confidential application has no secret.
    #[error("The client secret cannot be null or empty for a confidential application.")]
    MissingClientSecret,

    /// A public application has a secret.
    #[error("A client secret cannot be associated with a public application.")]
    UnexpectedClientSecret,

    /// A redirect URI is empty.
    #[error("Callback URLs cannot be null or empty.")]
    EmptyRedirectUri,

    /// A redirect URI is relative or malformed.
    #[error("Callback URLs must be valid absolute URLs: '{0}'.")]
    InvalidRedirectUri(String),

    /// A redirect URI carries a fragment.
    #[error("Callback URLs cannot contain a fragment: '{0}'.")]
    RedirectUriFragment(String),

    /// A grant type permission lacks a prerequisite endpoint permission.
    #[error("The '{grant_type}' grant type requires adding the {endpoint} endpoint permission.")]
    MissingEndpointPermission {
        /// The grant type, without prefix.
        grant_type: &'static str,
        /// The missing endpoint, without prefix.
        endpoint: &'static str,
    },
}

// =============================================================================
// Validator
// =============================================================================

/// Validates application records before they are persisted.
#[async_trait]
pub trait ApplicationValidator: Send + Sync {
    /// Returns every violation of `record`, in reporting order.
    ///
    /// # Errors
    ///
    /// Returns an error if a store lookup fails or the operation is cancelled.
    async fn validate(
        &self,
        store: &dyn ApplicationStore,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Violation>>;
}

/// Grant types and the endpoints they cannot work without.
const ENDPOINT_REQUIREMENTS: &[(&str, &str)] = &[
    (grant_types::AUTHORIZATION_CODE, endpoints::AUTHORIZATION),
    (grant_types::AUTHORIZATION_CODE, endpoints::TOKEN),
    (grant_types::CLIENT_CREDENTIALS, endpoints::TOKEN),
    (grant_types::IMPLICIT, endpoints::AUTHORIZATION),
    (grant_types::PASSWORD, endpoints::TOKEN),
    (grant_types::REFRESH_TOKEN, endpoints::TOKEN),
];

/// Default validation rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultApplicationValidator;

#[async_trait]
impl ApplicationValidator for DefaultApplicationValidator {
    async fn validate(
        &self,
        store: &dyn ApplicationStore,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Violation>> {
        let mut violations = Vec::new();

        match record.client_id() {
            None => violations.push(Violation::EmptyClientId),
            Some(client_id) => {
                if cancel.is_cancelled() {
                    return Err(AppError::Cancelled);
                }

                // The store may match case-insensitively.
                if let Some(other) = store.find_by_client_id(client_id, cancel).await? {
                    if other.client_id() == Some(client_id) && other.id() != record.id() {
                        violations.push(Violation::DuplicateClientId);
                    }
                }
            }
        }

        if let Some(violation) = check_client_type(record) {
            violations.push(violation);
        }

        if let Some(violation) = check_redirect_uris(record) {
            violations.push(violation);
        }

        violations.extend(check_endpoint_requirements(record));

        Ok(violations)
    }
}

fn check_client_type(record: &ApplicationRecord) -> Option<Violation> {
    let raw = match record.client_type() {
        None => return Some(Violation::EmptyClientType),
        Some(raw) => raw,
    };

    match raw.parse::<ClientType>() {
        Err(_) => Some(Violation::InvalidClientType(raw.to_string())),
        Ok(ClientType::Confidential) if record.client_secret().is_none() => {
            Some(Violation::MissingClientSecret)
        }
        Ok(ClientType::Public) if record.client_secret().is_some() => {
            Some(Violation::UnexpectedClientSecret)
        }
        Ok(_) => None,
    }
}

fn check_redirect_uris(record: &ApplicationRecord) -> Option<Violation> {
    record
        .post_logout_redirect_uris
        .iter()
        .chain(record.redirect_uris.iter())
        .find_map(|address| match AbsoluteUri::parse(address) {
            Err(violation) => Some(violation),
            Ok(uri) if uri.has_fragment() => {
                Some(Violation::RedirectUriFragment(address.clone()))
            }
            Ok(_) => None,
        })
}

fn check_endpoint_requirements(record: &ApplicationRecord) -> Vec<Violation> {
    let granted = PermissionSet::new(record);
    if !granted.any_with_prefix(prefixes::ENDPOINT) {
        return Vec::new();
    }

    ENDPOINT_REQUIREMENTS
        .iter()
        .filter(|&&(grant_type, endpoint)| {
            granted.contains(grant_type) && !granted.contains(endpoint)
        })
        .map(|&(grant_type, endpoint)| Violation::MissingEndpointPermission {
            grant_type: strip(grant_type, prefixes::GRANT_TYPE),
            endpoint: strip(endpoint, prefixes::ENDPOINT),
        })
        .collect()
}

fn strip(permission: &'static str, prefix: &str) -> &'static str {
    permission.strip_prefix(prefix).unwrap_or(permission)
}
