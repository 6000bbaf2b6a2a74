//! Application registry error types.
//!
//! This module defines the errors surfaced by the application manager and its
//! collaborators. Secret verification failures are deliberately absent: they
//! are reported as `false` results, never as errors.

use std::fmt;

use crate::validation::Violation;

/// Errors that can occur while managing client applications.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A required argument was missing or empty.
    #[error("Precondition failed: {message}")]
    Precondition {
        /// Description of the violated precondition.
        message: String,
    },

    /// The application failed validation and was not persisted.
    #[error("Validation failed: {violation}")]
    Validation {
        /// The first violation reported by the validator.
        violation: Violation,
    },

    /// A stored or supplied value is structurally unsupported.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the unsupported state.
        message: String,
    },

    /// An error occurred while storing or retrieving applications.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    /// Creates a new `Precondition` error.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Creates a new `Validation` error from the first reported violation.
    #[must_use]
    pub fn validation(violation: Violation) -> Self {
        Self::Validation { violation }
    }

    /// Creates a new `InvalidState` error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the violation carried by a `Validation` error.
    #[must_use]
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Validation { violation } => Some(violation),
            _ => None,
        }
    }

    /// Returns `true` if the caller can fix this error by changing its input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Precondition { .. } | Self::Validation { .. } | Self::InvalidState { .. }
        )
    }

    /// Returns `true` if this error originates from infrastructure or a bug.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Internal { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Precondition { .. } => ErrorCategory::Caller,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::InvalidState { .. } => ErrorCategory::State,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

/// Categories of registry errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller passed a missing or empty argument.
    Caller,
    /// The application record is inconsistent.
    Validation,
    /// A value is unsupported by the engine.
    State,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Internal errors.
    Internal,
    /// Cooperative cancellation.
    Cancelled,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caller => write!(f, "caller"),
            Self::Validation => write!(f, "validation"),
            Self::State => write!(f, "state"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}
