//! Absolute redirect URI values.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::validation::Violation;

/// A parsed absolute URI that remembers the exact text it was parsed from.
///
/// `Url` normalizes its input (lowercased host, trailing slash on empty paths),
/// so the original string is kept alongside the parsed value and returned by
/// [`AbsoluteUri::as_str`]. Converting a record to a descriptor and back is
/// therefore byte-exact.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AbsoluteUri {
    raw: String,
    parsed: Url,
}

impl AbsoluteUri {
    /// Parses an absolute URI.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::EmptyRedirectUri`] for an empty string and
    /// [`Violation::InvalidRedirectUri`] for relative or malformed input.
    pub fn parse(value: &str) -> Result<Self, Violation> {
        if value.is_empty() {
            return Err(Violation::EmptyRedirectUri);
        }

        match Url::parse(value) {
            Ok(parsed) => Ok(Self {
                raw: value.to_string(),
                parsed,
            }),
            Err(_) => Err(Violation::InvalidRedirectUri(value.to_string())),
        }
    }

    /// Returns the URI exactly as it was supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed representation.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.parsed
    }

    /// Returns `true` if the URI carries a non-empty fragment.
    #[must_use]
    pub fn has_fragment(&self) -> bool {
        self.parsed.fragment().is_some_and(|f| !f.is_empty())
    }
}

impl fmt::Debug for AbsoluteUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AbsoluteUri").field(&self.raw).finish()
    }
}

impl fmt::Display for AbsoluteUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for AbsoluteUri {
    type Error = Violation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AbsoluteUri> for String {
    fn from(value: AbsoluteUri) -> Self {
        value.raw
    }
}

impl std::str::FromStr for AbsoluteUri {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
