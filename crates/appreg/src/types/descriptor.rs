//! Application descriptors.
//!
//! A descriptor is a plain, fully mutable snapshot of an application's fields.
//! It is the input of [`ApplicationManager::create_from_descriptor`] and the
//! value handed to the transform of [`ApplicationManager::update_with`].
//! Unlike a record, its secret is plaintext and its URIs are parsed.
//!
//! [`ApplicationManager::create_from_descriptor`]: crate::ApplicationManager::create_from_descriptor
//! [`ApplicationManager::update_with`]: crate::ApplicationManager::update_with

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::application::ClientType;
use super::uri::AbsoluteUri;

/// Transient description of a client application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDescriptor {
    /// Client identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Plaintext client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Client type (`public`, `confidential` or `hybrid`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,

    /// Consent type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_type: Option<String>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Permissions.
    #[serde(default)]
    pub permissions: BTreeSet<String>,

    /// Post-logout redirect URIs.
    #[serde(default)]
    pub post_logout_redirect_uris: Vec<AbsoluteUri>,

    /// Redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<AbsoluteUri>,
}

impl ApplicationDescriptor {
    /// Creates a descriptor for the given client identifier.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Default::default()
        }
    }

    /// Sets the plaintext client secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the client type.
    #[must_use]
    pub fn with_client_type(mut self, client_type: ClientType) -> Self {
        self.client_type = Some(client_type.as_str().to_string());
        self
    }

    /// Sets the consent type.
    #[must_use]
    pub fn with_consent_type(mut self, consent_type: impl Into<String>) -> Self {
        self.consent_type = Some(consent_type.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Adds a permission.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Adds several permissions.
    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Appends a redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: AbsoluteUri) -> Self {
        self.redirect_uris.push(uri);
        self
    }

    /// Appends a post-logout redirect URI.
    #[must_use]
    pub fn with_post_logout_redirect_uri(mut self, uri: AbsoluteUri) -> Self {
        self.post_logout_redirect_uris.push(uri);
        self
    }
}
