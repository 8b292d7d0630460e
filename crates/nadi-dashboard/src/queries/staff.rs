use super::{fetch_error, write_error};
use crate::error::{MutationError, RemoteFetchError, WriteOp};
use nadi_model::{NewStaffMember, Record, SiteId, StaffId, StaffMember, StaffPatch, Validate};
use nadi_source::{
    delete_record, insert_record, select_records, update_record, DataSource, Direction, Select,
};

/// Staff roster of `site`, by name
///
/// # Errors
/// [`RemoteFetchError`] if the remote read fails
pub async fn fetch_staff(
    source: &dyn DataSource,
    site: Option<SiteId>,
) -> Result<Vec<StaffMember>, RemoteFetchError> {
    let Some(site) = site else {
        return Ok(Vec::new());
    };
    select_records(
        source,
        Select::from(StaffMember::TABLE)
            .eq("site_id", site)
            .order_by("name", Direction::Ascending),
    )
    .await
    .map_err(fetch_error::<StaffMember>)
}

/// Add a staff member
///
/// # Errors
/// [`MutationError::Validation`] before dispatch, or the remote write error
pub async fn create_staff_member(
    source: &dyn DataSource,
    member: NewStaffMember,
) -> Result<StaffMember, MutationError> {
    let member = member.validate()?;
    insert_record(source, &member)
        .await
        .map_err(write_error::<StaffMember>(WriteOp::Create))
}

/// Patch a staff member
///
/// # Errors
/// [`MutationError::Validation`] before dispatch, or the remote write error
pub async fn update_staff_member(
    source: &dyn DataSource,
    id: StaffId,
    patch: StaffPatch,
) -> Result<StaffMember, MutationError> {
    let patch = patch.validate()?;
    update_record(source, id, &patch)
        .await
        .map_err(write_error::<StaffMember>(WriteOp::Update))
}

/// Remove a staff member and return the removed row
///
/// # Errors
/// The remote write error
pub async fn delete_staff_member(
    source: &dyn DataSource,
    id: StaffId,
) -> Result<StaffMember, MutationError> {
    delete_record(source, id)
        .await
        .map_err(write_error::<StaffMember>(WriteOp::Delete))
}
