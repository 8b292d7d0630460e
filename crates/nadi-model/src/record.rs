//! Table binding for entity rows

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// A row type stored in one backend table
///
/// Implemented by every entity so the typed helpers of the data source can
/// address the right table and decode rows without naming it at call sites.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier type of this row
    type Id: Copy + fmt::Display + Into<serde_json::Value> + Send + Sync;

    /// Backend table name
    const TABLE: &'static str;

    /// Human readable entity name used in errors and notifications
    const ENTITY: &'static str;

    /// Get the row identifier
    fn id(&self) -> Self::Id;
}
