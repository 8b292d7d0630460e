//! The data source capability and typed helpers over it

use crate::error::RemoteError;
use crate::select::{Filter, Row, Select};
use async_trait::async_trait;
use nadi_model::Record;
use serde::Serialize;
use std::fmt::Debug;

/// Remote table store
///
/// Every wrapper receives one of these explicitly; whether it is the hosted
/// backend or an in-memory fake is decided once, where the context is built.
#[async_trait]
pub trait DataSource: Send + Sync + Debug {
    /// Short name for logs (`memory`, `rest`, ...)
    fn name(&self) -> &'static str;

    /// Read rows
    async fn select(&self, query: Select) -> Result<Vec<Row>, RemoteError>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: &str, row: Row) -> Result<Row, RemoteError>;

    /// Merge `patch` into every row matching `filters`; return the updated rows
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, RemoteError>;

    /// Remove every row matching `filters`; return the removed rows
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, RemoteError>;
}

/// Encode a payload as a row of `table`
///
/// # Errors
/// [`RemoteError::Encode`] if the payload does not serialise to an object
pub fn to_row<T: Serialize + ?Sized>(table: &str, payload: &T) -> Result<Row, RemoteError> {
    let encode = |message: String| RemoteError::Encode {
        table: table.to_string(),
        message,
    };
    match serde_json::to_value(payload).map_err(|e| encode(e.to_string()))? {
        serde_json::Value::Object(row) => Ok(row),
        other => Err(encode(format!("expected an object, got {other}"))),
    }
}

/// Decode a row of `R::TABLE`
///
/// # Errors
/// [`RemoteError::Decode`] if the row does not match `R`
pub fn from_row<R: Record>(row: Row) -> Result<R, RemoteError> {
    serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| RemoteError::Decode {
        table: R::TABLE.to_string(),
        message: e.to_string(),
    })
}

fn exactly_one<R: Record>(rows: Vec<Row>) -> Result<R, RemoteError> {
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => from_row(row),
        _ => Err(RemoteError::NotFound {
            table: R::TABLE.to_string(),
        }),
    }
}

/// Select and decode rows of `R`
///
/// # Errors
/// Propagates the source error or a decode failure
pub async fn select_records<R: Record>(
    source: &dyn DataSource,
    query: Select,
) -> Result<Vec<R>, RemoteError> {
    debug_assert_eq!(query.table(), R::TABLE);
    source
        .select(query)
        .await?
        .into_iter()
        .map(from_row)
        .collect()
}

/// Insert a payload into `R::TABLE` and decode the stored row
///
/// # Errors
/// Propagates the source error or an encode/decode failure
pub async fn insert_record<R, P>(source: &dyn DataSource, payload: &P) -> Result<R, RemoteError>
where
    R: Record,
    P: Serialize + Sync + ?Sized,
{
    let row = to_row(R::TABLE, payload)?;
    from_row(source.insert(R::TABLE, row).await?)
}

/// Patch the row with `id`
///
/// # Errors
/// [`RemoteError::NotFound`] unless exactly one row was updated
pub async fn update_record<R, P>(
    source: &dyn DataSource,
    id: R::Id,
    patch: &P,
) -> Result<R, RemoteError>
where
    R: Record,
    P: Serialize + Sync + ?Sized,
{
    update_matching(source, &[Filter::eq("id", id)], patch).await
}

/// Patch the single row matching `filters`
///
/// # Errors
/// [`RemoteError::NotFound`] unless exactly one row was updated
pub async fn update_matching<R, P>(
    source: &dyn DataSource,
    filters: &[Filter],
    patch: &P,
) -> Result<R, RemoteError>
where
    R: Record,
    P: Serialize + Sync + ?Sized,
{
    let row = to_row(R::TABLE, patch)?;
    exactly_one(source.update(R::TABLE, filters, row).await?)
}

/// Patch every row matching `filters`
///
/// # Errors
/// Propagates the source error or an encode/decode failure
pub async fn update_all<R, P>(
    source: &dyn DataSource,
    filters: &[Filter],
    patch: &P,
) -> Result<Vec<R>, RemoteError>
where
    R: Record,
    P: Serialize + Sync + ?Sized,
{
    let row = to_row(R::TABLE, patch)?;
    source
        .update(R::TABLE, filters, row)
        .await?
        .into_iter()
        .map(from_row)
        .collect()
}

/// Delete the row with `id` and return it
///
/// # Errors
/// [`RemoteError::NotFound`] unless exactly one row was removed
pub async fn delete_record<R: Record>(
    source: &dyn DataSource,
    id: R::Id,
) -> Result<R, RemoteError> {
    exactly_one(source.delete(R::TABLE, &[Filter::eq("id", id)]).await?)
}
