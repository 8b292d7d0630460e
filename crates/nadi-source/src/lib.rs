//! Remote data client for the NADI admin dashboard
//!
//! The dashboard reads and writes rows of a hosted PostgREST backend. This
//! crate puts that behind the [`DataSource`] trait so every wrapper can be
//! exercised against an [`InMemorySource`] with identical semantics.
//!
//! # Key Types
//!
//! - [`DataSource`]: async select/insert/update/delete on named tables
//! - [`Select`]: chained filter, order and limit builder
//! - [`InMemorySource`]: in-process tables, seedable from JSON
//! - [`RestSource`]: the real backend over `reqwest`
//! - [`SourceConfig`]: picks one of the above
//!
//! Typed helpers ([`select_records`], [`insert_record`], ...) decode rows
//! into [`nadi_model::Record`] types.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod memory;
pub mod rest;
pub mod select;
pub mod source;

pub use config::SourceConfig;
pub use error::{RemoteError, SourceError};
pub use memory::InMemorySource;
pub use rest::RestSource;
pub use select::{Direction, Filter, FilterOp, Order, Row, Select};
pub use source::{
    delete_record, from_row, insert_record, select_records, to_row, update_all, update_matching,
    update_record, DataSource,
};
