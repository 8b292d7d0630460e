//! Error types for the data model
//!
//! Provides the two client-side failure kinds:
//! - Validation failures detected before any remote dispatch
//! - Authorization failures for role and ownership checks

use crate::access::{Action, UserType};
use crate::ids::UserId;

/// Route the UI navigates to when an authorization check fails
pub const UNAUTHORIZED_REDIRECT: &str = "/unauthorized";

/// Payload rejected before it reached the backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required field missing or blank
    #[error("{field} is required")]
    Missing {
        /// Offending field
        field: &'static str,
    },

    /// Text field longer than allowed
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Offending field
        field: &'static str,
        /// Maximum length in characters
        max: usize,
    },

    /// Window whose end lies before its start
    #[error("{end_field} ({end}) must not be before {start_field} ({start})")]
    EndBeforeStart {
        /// Field holding the window start
        start_field: &'static str,
        /// Field holding the window end
        end_field: &'static str,
        /// Submitted start
        start: String,
        /// Submitted end
        end: String,
    },

    /// Field present but malformed
    #[error("{field} is invalid: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with the value
        reason: String,
    },
}

impl ValidationError {
    /// Create invalid-field error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::TooLong { field, .. } | Self::Invalid { field, .. } => {
                field
            }
            Self::EndBeforeStart { end_field, .. } => end_field,
        }
    }
}

/// Role or ownership check failed
///
/// The dashboard surfaces these as a redirect rather than an inline error;
/// [`AuthorizationError::redirect_to`] names the target route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    /// The session's user type may not perform the action
    #[error("{user_type} users may not {action}")]
    Forbidden {
        /// Type of the signed-in user
        user_type: UserType,
        /// Action that was attempted
        action: Action,
    },

    /// The session does not own the target user's records
    #[error("records of user {target} belong to another user")]
    NotOwner {
        /// Owner of the records
        target: UserId,
    },
}

impl AuthorizationError {
    /// Route to redirect to
    #[inline]
    #[must_use]
    pub fn redirect_to(&self) -> &'static str {
        UNAUTHORIZED_REDIRECT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::Missing { field: "title" };
        assert_eq!(err.to_string(), "title is required");
        assert_eq!(err.field(), "title");
    }

    #[test]
    fn end_before_start_names_both_fields() {
        let err = ValidationError::EndBeforeStart {
            start_field: "start_date",
            end_field: "end_date",
            start: "2025-01-10".to_string(),
            end: "2025-01-05".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("end_date (2025-01-05)"));
        assert!(message.contains("start_date (2025-01-10)"));
        assert_eq!(err.field(), "end_date");
    }

    #[test]
    fn authorization_error_redirects() {
        let err = AuthorizationError::Forbidden {
            user_type: UserType::Member,
            action: Action::ManageClosures,
        };
        assert_eq!(err.to_string(), "member users may not manage closures");
        assert_eq!(err.redirect_to(), UNAUTHORIZED_REDIRECT);
    }
}
