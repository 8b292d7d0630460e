//! Client-side validation stage
//!
//! Mutation wrappers validate payloads before dispatch. Validation is a pure
//! function from a payload to `Result<Valid<T>, ValidationError>`; only this
//! crate can construct a [`Valid`], so holding one proves the checks ran.

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::ops::Deref;

/// Maximum length of short text fields (titles, names)
pub const MAX_TITLE_LEN: usize = 255;

/// Maximum length of long text fields (messages, descriptions, reasons)
pub const MAX_BODY_LEN: usize = 5_000;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,18}[0-9]$").expect("phone pattern compiles"));

/// Payload that can be checked before it is sent to the backend
pub trait Validate: Sized {
    /// Run all checks
    ///
    /// # Errors
    /// Returns the first violated rule
    fn validate(self) -> Result<Valid<Self>, ValidationError>;
}

/// A payload that passed [`Validate::validate`]
#[derive(Debug, Clone, PartialEq)]
pub struct Valid<T>(T);

impl<T> Valid<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(value)
    }

    /// Get the validated payload
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Valid<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Serialize> Serialize for Valid<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Require non-blank text of bounded length
pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing { field });
    }
    check_length(field, value, max)
}

/// Optional text: blank is fine, but it must fit
pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Require a present value
pub(crate) fn require<'a, T>(
    field: &'static str,
    value: Option<&'a T>,
) -> Result<&'a T, ValidationError> {
    value.ok_or(ValidationError::Missing { field })
}

/// Require `end >= start`
pub(crate) fn require_order<T: PartialOrd + Display>(
    start_field: &'static str,
    start: &T,
    end_field: &'static str,
    end: &T,
) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::EndBeforeStart {
            start_field,
            end_field,
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

/// Require a plausible e-mail address
pub(crate) fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require_text(field, value, MAX_TITLE_LEN)?;
    if EMAIL.is_match(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::invalid(field, "not an e-mail address"))
    }
}

/// Require a plausible phone number
pub(crate) fn require_phone(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if PHONE.is_match(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::invalid(field, "not a phone number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_missing() {
        assert_eq!(
            require_text("title", "   ", 10),
            Err(ValidationError::Missing { field: "title" })
        );
    }

    #[test]
    fn long_text_is_rejected() {
        assert_eq!(
            require_text("title", "abcdef", 5),
            Err(ValidationError::TooLong {
                field: "title",
                max: 5
            })
        );
        assert!(require_text("title", "abcde", 5).is_ok());
    }

    #[test]
    fn order_allows_equal_ends() {
        assert!(require_order("start", &3, "end", &3).is_ok());
        assert!(require_order("start", &3, "end", &2).is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(require_email("email", "siti@nadi.my").is_ok());
        assert!(require_email("email", "siti@nadi").is_err());
        assert!(require_email("email", "").is_err());
    }

    #[test]
    fn phone_shapes() {
        assert!(require_phone("phone", "+60 12-345 6789").is_ok());
        assert!(require_phone("phone", "0123456789").is_ok());
        assert!(require_phone("phone", "call me").is_err());
    }
}
