//! Keyed query cache for the NADI admin dashboard
//!
//! Sits between presentation code and the query/mutation wrappers:
//!
//! ```text
//! QueryObserver ──key──▶ QueryClient ──miss──▶ fetcher (query wrapper)
//!       ▲                    │
//!       └── QueryResult ◀── invalidate(keys) ◀── MutationRunner
//! ```
//!
//! # Key Types
//!
//! - [`QueryKey`]: ordered segments, prefix-invalidated
//! - [`QueryClient`]: cache, in-flight de-duplication, invalidation
//! - [`QueryObserver`]: live `{status, data, error}` view of one key
//! - [`MutationRunner`]: runs a mutation, invalidates, notifies
//! - [`Notifier`] / [`Toast`]: user-visible notification side channel

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod error;
pub mod key;
pub mod mutation;
pub mod notify;
pub mod observer;

pub use client::{CacheConfig, CacheStats, KeyState, QueryClient, QueryStatus};
pub use error::QueryError;
pub use key::QueryKey;
pub use mutation::MutationRunner;
pub use notify::{ChannelNotifier, Notifier, Toast, ToastVariant, TracingNotifier};
pub use observer::{QueryObserver, QueryResult};
