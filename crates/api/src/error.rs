// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use studyq_domain::DomainError;
use studyq_persistence::PersistenceError;
use thiserror::Error;
use time::OffsetDateTime;

use crate::password_policy::PasswordViolation;

/// Authentication and authorization errors.
///
/// Unknown usernames and wrong passwords both surface as
/// `InvalidCredentials` so callers cannot tell which accounts exist.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The account has been deactivated.
    #[error("Account is inactive. Please contact administrator.")]
    AccountInactive,

    /// Too many failed attempts; sign-in is refused until `until`.
    #[error("Account is temporarily locked due to too many failed attempts")]
    AccountLocked {
        /// When the lock lifts.
        until: OffsetDateTime,
    },

    /// The session token is unknown or malformed.
    #[error("Invalid session token")]
    SessionInvalid,

    /// The session token has expired.
    #[error("Session expired")]
    SessionExpired,

    /// The actor's role does not permit the action.
    #[error("Unauthorized: '{action}' requires {required_role} role")]
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },

    /// The credential store could not be read or written.
    #[error("Credential store failure: {0}")]
    StorageFailure(String),
}

/// API-level errors.
///
/// These are distinct from domain/persistence errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// The account is locked after repeated failures.
    AccountLocked {
        /// A human-readable description.
        message: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// A third-party provider is not configured.
    ProviderUnavailable {
        /// A human-readable description.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// Every violated rule, joined for display.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => write!(f, "{reason}"),
            Self::AccountLocked { message }
            | Self::ProviderUnavailable { message }
            | Self::PasswordPolicyViolation { message } => write!(f, "{message}"),
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AccountLocked { .. } => Self::AccountLocked {
                message: err.to_string(),
            },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
            AuthError::StorageFailure(message) => Self::Internal { message },
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::SessionInvalid
            | AuthError::SessionExpired => Self::AuthenticationFailed {
                reason: err.to_string(),
            },
        }
    }
}

impl From<Vec<PasswordViolation>> for ApiError {
    fn from(violations: Vec<PasswordViolation>) -> Self {
        let message: String = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<String>>()
            .join(", ");
        Self::PasswordPolicyViolation { message }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::AccountNotFound(id) => Self::ResourceNotFound {
                resource_type: String::from("Account"),
                message: format!("Account '{id}' does not exist"),
            },
            PersistenceError::MaterialNotFound(id) => Self::ResourceNotFound {
                resource_type: String::from("Material"),
                message: format!("Material '{id}' does not exist"),
            },
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let field: &str = match &err {
        DomainError::DuplicateUsername(_) => {
            return ApiError::DomainRuleViolation {
                rule: String::from("unique_username"),
                message: err.to_string(),
            };
        }
        DomainError::DuplicateEmail(_) => {
            return ApiError::DomainRuleViolation {
                rule: String::from("unique_email"),
                message: err.to_string(),
            };
        }
        DomainError::InvalidUsername(_) => "username",
        DomainError::InvalidEmail(_) => "email",
        DomainError::InvalidName(_) => "name",
        DomainError::InvalidRole(_) => "role",
        DomainError::InvalidSemester { .. } => "semester",
        DomainError::InvalidAcademicYear(_) => "academic_year",
        DomainError::MissingStudentProfile(_) => "academic_profile",
        DomainError::InvalidWhatsAppNumber(_) => "whatsapp_number",
        DomainError::InvalidTitle(_) => "title",
        DomainError::InvalidSubject(_) => "subject",
        DomainError::UnsupportedFileType(_) => "file_name",
        DomainError::FileTooLarge { .. } => "file_size",
        DomainError::InvalidDeliveryChannel(_) => "channel",
        DomainError::InvalidDeliveryStatus(_) => "status",
        DomainError::SettingOutOfRange { setting, .. } => *setting,
    };
    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}
