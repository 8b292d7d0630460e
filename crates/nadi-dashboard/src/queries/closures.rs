use super::{fetch_error, write_error};
use crate::error::{MutationError, RemoteFetchError, WriteOp};
use nadi_model::{
    ClosureId, ClosurePatch, ClosureRange, ClosureRecord, NewClosure, Record, SiteId, Validate,
};
use nadi_source::{
    delete_record, insert_record, select_records, update_record, DataSource, Direction, Select,
};

/// Closures of `site` overlapping `range`, earliest first
///
/// # Errors
/// [`RemoteFetchError`] if the remote read fails
pub async fn fetch_closures(
    source: &dyn DataSource,
    site: Option<SiteId>,
    range: ClosureRange,
) -> Result<Vec<ClosureRecord>, RemoteFetchError> {
    let Some(site) = site else {
        return Ok(Vec::new());
    };

    let mut query = Select::from(ClosureRecord::TABLE).eq("site_id", site);
    if let Some(from) = range.from {
        query = query.gte("end_date", from);
    }
    if let Some(until) = range.until {
        query = query.lte("start_date", until);
    }

    select_records(source, query.order_by("start_date", Direction::Ascending))
        .await
        .map_err(fetch_error::<ClosureRecord>)
}

/// Create a closure
///
/// # Errors
/// [`MutationError::Validation`] before dispatch, or the remote write error
pub async fn create_closure(
    source: &dyn DataSource,
    closure: NewClosure,
) -> Result<ClosureRecord, MutationError> {
    let closure = closure.validate()?;
    insert_record(source, &closure)
        .await
        .map_err(write_error::<ClosureRecord>(WriteOp::Create))
}

/// Patch a closure
///
/// # Errors
/// [`MutationError::Validation`] before dispatch, or the remote write error
pub async fn update_closure(
    source: &dyn DataSource,
    id: ClosureId,
    patch: ClosurePatch,
) -> Result<ClosureRecord, MutationError> {
    let patch = patch.validate()?;
    update_record(source, id, &patch)
        .await
        .map_err(write_error::<ClosureRecord>(WriteOp::Update))
}

/// Delete a closure and return it
///
/// # Errors
/// The remote write error
pub async fn delete_closure(
    source: &dyn DataSource,
    id: ClosureId,
) -> Result<ClosureRecord, MutationError> {
    delete_record(source, id)
        .await
        .map_err(write_error::<ClosureRecord>(WriteOp::Delete))
}
