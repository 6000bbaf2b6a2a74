//! Client application domain types.
//!
//! This module defines the `ApplicationRecord` struct persisted by storage
//! backends, together with the client and consent type vocabularies.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Client Type
// =============================================================================

/// OAuth 2.0 client types.
///
/// Determines whether a client is expected to hold a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// Cannot keep a secret; never authenticates with one.
    Public,
    /// Must authenticate with a client secret.
    Confidential,
    /// May hold a secret but is not required to.
    Hybrid,
}

impl ClientType {
    /// Returns the stored representation of the client type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Confidential => "confidential",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown client type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown client type: '{0}'")]
pub struct UnknownClientType(pub String);

impl FromStr for ClientType {
    type Err = UnknownClientType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "confidential" => Ok(Self::Confidential),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(UnknownClientType(other.to_string())),
        }
    }
}

// =============================================================================
// Consent Type
// =============================================================================

/// Well-known consent types.
///
/// The engine stores consent types as free-form strings; these are the values
/// authorization servers conventionally understand.
pub mod consent_types {
    /// The user must explicitly approve every authorization request.
    pub const EXPLICIT: &str = "explicit";
    /// Consent is managed by an external system.
    pub const EXTERNAL: &str = "external";
    /// Consent is granted implicitly.
    pub const IMPLICIT: &str = "implicit";
    /// Consent is requested once and remembered.
    pub const SYSTEMATIC: &str = "systematic";
}

// =============================================================================
// Application Record
// =============================================================================

/// A registered OAuth 2.0 / OpenID Connect client application.
///
/// String fields are optional; an absent value and an empty string are treated
/// identically by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    /// Opaque identifier assigned by the store on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Unique client identifier used in OAuth flows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Obfuscated client secret. Never holds plaintext once persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Stored client type (`public`, `confidential` or `hybrid`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,

    /// Consent type. Defaults to `explicit` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_type: Option<String>,

    /// Human-readable display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Granted permissions (`endpoint:*`, `grant_type:*`, `scope:*` or plain).
    #[serde(default)]
    pub permissions: BTreeSet<String>,

    /// Allowed post-logout redirect URIs.
    #[serde(default)]
    pub post_logout_redirect_uris: Vec<String>,

    /// Allowed redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ApplicationRecord {
    /// Returns the client identifier, treating an empty value as absent.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        non_empty(&self.client_id)
    }

    /// Returns the obfuscated secret, treating an empty value as absent.
    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        non_empty(&self.client_secret)
    }

    /// Returns the raw client type, treating an empty value as absent.
    #[must_use]
    pub fn client_type(&self) -> Option<&str> {
        non_empty(&self.client_type)
    }

    /// Returns the store-assigned identifier, treating an empty value as absent.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        non_empty(&self.id)
    }
}

/// Returns the contained string unless it is absent or empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
