//! Query errors

use crate::key::QueryKey;
use std::error::Error as StdError;
use std::sync::Arc;

/// Failure surfaced by the query client
///
/// Cloneable so one failed fetch can be handed to every joined waiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    /// The fetcher returned an error
    #[error("{0}")]
    Failed(Arc<dyn StdError + Send + Sync>),

    /// A cached value under this key has another type than requested
    #[error("cached value for {key} has an unexpected type")]
    TypeMismatch {
        /// The key that was read
        key: QueryKey,
    },
}

impl QueryError {
    /// Wrap a fetcher error
    #[must_use]
    pub fn failed<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        Self::Failed(Arc::new(error))
    }

    /// Borrow the fetcher error as a concrete type
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Failed(inner) => inner.downcast_ref::<E>(),
            Self::TypeMismatch { .. } => None,
        }
    }
}
