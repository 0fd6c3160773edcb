//! Authorization engine error types.
//!
//! Denial of access is never an error: decisions are plain booleans. The
//! variants here cover broken configuration, missing roles, read-only role
//! sources and failing role providers.

use std::fmt;

/// Errors that can occur while loading roles or resolving role hierarchies.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A role or policy declaration is malformed.
    ///
    /// Raised while role definitions are loaded; aborts role-set construction.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// No role provider knows the requested role.
    #[error("Role not found: {code}")]
    RoleNotFound {
        /// Code of the missing role.
        code: String,
    },

    /// The role source does not support the requested operation.
    #[error("Unsupported operation: {message}")]
    UnsupportedOperation {
        /// Description of the unsupported operation.
        message: String,
    },

    /// The caller passed an invalid argument.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of why the input is invalid.
        message: String,
    },

    /// A role provider failed while being queried.
    #[error("Role provider error: {provider} - {message}")]
    Provider {
        /// Name of the failing provider.
        provider: String,
        /// Description of the failure.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `RoleNotFound` error.
    #[must_use]
    pub fn role_not_found(code: impl Into<String>) -> Self {
        Self::RoleNotFound { code: code.into() }
    }

    /// Creates a new `UnsupportedOperation` error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new `Provider` error.
    #[must_use]
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
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

    /// Returns `true` if the error reports a missing role.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RoleNotFound { .. })
    }

    /// Returns `true` if callers are expected to handle the error as a normal
    /// outcome (for example by showing a notification) rather than a fault.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RoleNotFound { .. }
                | Self::UnsupportedOperation { .. }
                | Self::InvalidInput { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::RoleNotFound { .. } => ErrorCategory::NotFound,
            Self::UnsupportedOperation { .. } => ErrorCategory::Unsupported,
            Self::InvalidInput { .. } => ErrorCategory::Validation,
            Self::Provider { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of authorization engine errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed role or policy declarations.
    Configuration,
    /// Missing roles.
    NotFound,
    /// Operations a role source does not support.
    Unsupported,
    /// Invalid caller input.
    Validation,
    /// Role provider failures.
    Infrastructure,
    /// Internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::NotFound => write!(f, "not_found"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
