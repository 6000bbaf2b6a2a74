//! Application permissions and entailment.
//!
//! Permissions are strings namespaced by a prefix:
//!
//! - `endpoint:*` - endpoints the client may call
//! - `grant_type:*` - flows the client may use
//! - `scope:*` - scopes the client may request
//! - unprefixed - plain capability names
//!
//! A category with no explicit entry is open: a client without any `endpoint:`
//! permission may call every endpoint. Listing a single entry turns the category
//! into an allow-list. Grant types and scopes are derived categories: when left
//! open they are still only granted while their prerequisite endpoints remain
//! reachable.

use crate::types::ApplicationRecord;

/// Permission prefixes.
pub mod prefixes {
    /// Endpoint permission prefix.
    pub const ENDPOINT: &str = "endpoint:";
    /// Grant type permission prefix.
    pub const GRANT_TYPE: &str = "grant_type:";
    /// Scope permission prefix.
    pub const SCOPE: &str = "scope:";
}

/// Endpoint permissions.
pub mod endpoints {
    /// Authorization endpoint.
    pub const AUTHORIZATION: &str = "endpoint:authorization";
    /// Device authorization endpoint.
    pub const DEVICE: &str = "endpoint:device";
    /// Introspection endpoint.
    pub const INTROSPECTION: &str = "endpoint:introspection";
    /// End-session endpoint.
    pub const LOGOUT: &str = "endpoint:logout";
    /// Revocation endpoint.
    pub const REVOCATION: &str = "endpoint:revocation";
    /// Token endpoint.
    pub const TOKEN: &str = "endpoint:token";
}

/// Grant type permissions.
pub mod grant_types {
    /// Authorization code flow.
    pub const AUTHORIZATION_CODE: &str = "grant_type:authorization_code";
    /// Client credentials flow.
    pub const CLIENT_CREDENTIALS: &str = "grant_type:client_credentials";
    /// Implicit flow.
    pub const IMPLICIT: &str = "grant_type:implicit";
    /// Resource owner password credentials flow.
    pub const PASSWORD: &str = "grant_type:password";
    /// Refresh token flow.
    pub const REFRESH_TOKEN: &str = "grant_type:refresh_token";
}

/// Scope permissions.
pub mod scopes {
    /// `address` scope.
    pub const ADDRESS: &str = "scope:address";
    /// `email` scope.
    pub const EMAIL: &str = "scope:email";
    /// `phone` scope.
    pub const PHONE: &str = "scope:phone";
    /// `profile` scope.
    pub const PROFILE: &str = "scope:profile";
    /// `roles` scope.
    pub const ROLES: &str = "scope:roles";
}

/// Decides whether a record is entitled to a permission.
///
/// Implementations may be swapped into the
/// [`ApplicationManager`](crate::ApplicationManager) to change entitlement rules
/// without touching the rest of the engine.
pub trait PermissionEvaluator: Send + Sync {
    /// Returns `true` if `record` is granted `permission`, explicitly or by entailment.
    fn has_permission(&self, record: &ApplicationRecord, permission: &str) -> bool;
}

/// Default entailment rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPermissionEvaluator;

impl PermissionEvaluator for DefaultPermissionEvaluator {
    fn has_permission(&self, record: &ApplicationRecord, permission: &str) -> bool {
        let granted = PermissionSet::new(record);

        if let Some(grant_type) = permission.strip_prefix(prefixes::GRANT_TYPE) {
            return granted.has_grant_type(permission, grant_type);
        }

        if permission.starts_with(prefixes::ENDPOINT) {
            return granted.has_endpoint(permission);
        }

        if permission.starts_with(prefixes::SCOPE) {
            return granted.has_scope(permission);
        }

        granted.contains(permission)
    }
}

/// Read-only view over a record's explicit permissions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PermissionSet<'a> {
    record: &'a ApplicationRecord,
}

impl<'a> PermissionSet<'a> {
    pub(crate) fn new(record: &'a ApplicationRecord) -> Self {
        Self { record }
    }

    pub(crate) fn contains(&self, permission: &str) -> bool {
        self.record.permissions.contains(permission)
    }

    pub(crate) fn any_with_prefix(&self, prefix: &str) -> bool {
        self.record
            .permissions
            .iter()
            .any(|p| p.starts_with(prefix))
    }

    fn has_endpoint(&self, endpoint: &str) -> bool {
        self.contains(endpoint) || !self.any_with_prefix(prefixes::ENDPOINT)
    }

    fn has_grant_type(&self, permission: &str, grant_type: &str) -> bool {
        if self.contains(permission) {
            return true;
        }

        if self.any_with_prefix(prefixes::GRANT_TYPE) {
            return false;
        }

        match grant_type {
            "authorization_code" => {
                self.has_endpoint(endpoints::AUTHORIZATION) && self.has_endpoint(endpoints::TOKEN)
            }
            "implicit" => self.has_endpoint(endpoints::AUTHORIZATION),
            _ => self.has_endpoint(endpoints::TOKEN),
        }
    }

    fn has_scope(&self, scope: &str) -> bool {
        if self.contains(scope) {
            return true;
        }

        if self.any_with_prefix(prefixes::SCOPE) {
            return false;
        }

        self.has_endpoint(endpoints::AUTHORIZATION) || self.has_endpoint(endpoints::TOKEN)
    }
}
