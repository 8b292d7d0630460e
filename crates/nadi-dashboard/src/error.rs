//! Error types for the dashboard wrappers
//!
//! - [`RemoteFetchError`]: a query wrapper's remote read failed
//! - [`RemoteWriteError`]: a mutation wrapper's remote write failed
//! - [`MutationError`]: anything a mutation can fail with, including the
//!   client-side validation and authorization stages

use nadi_model::{AuthorizationError, ValidationError};
use nadi_source::RemoteError;
use std::fmt;

/// Remote read failure of a query wrapper
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load {entity}: {source}")]
pub struct RemoteFetchError {
    /// Entity being read
    pub entity: &'static str,
    /// Underlying remote error
    pub source: RemoteError,
}

/// Kind of remote write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    /// Insert
    Create,
    /// Patch
    Update,
    /// Remove
    Delete,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Remote write failure of a mutation wrapper
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to {op} {entity}: {source}")]
pub struct RemoteWriteError {
    /// Entity being written
    pub entity: &'static str,
    /// Write kind
    pub op: WriteOp,
    /// Underlying remote error
    pub source: RemoteError,
}

/// Failure of a mutation at any stage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Rejected before dispatch
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Session may not perform the mutation
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// The remote write failed
    #[error(transparent)]
    Write(#[from] RemoteWriteError),
}

impl MutationError {
    /// Redirect target for authorization failures
    #[must_use]
    pub fn redirect_to(&self) -> Option<&'static str> {
        match self {
            Self::Authorization(err) => Some(err.redirect_to()),
            _ => None,
        }
    }
}
