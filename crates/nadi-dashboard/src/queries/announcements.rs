use super::{fetch_error, write_error};
use crate::error::{MutationError, RemoteFetchError, WriteOp};
use nadi_model::{
    Announcement, AnnouncementFilter, AnnouncementId, AnnouncementPatch, NewAnnouncement, Record,
    Validate,
};
use nadi_source::{
    delete_record, insert_record, select_records, update_record, DataSource, Direction, Select,
};

/// Announcements matching `filter`, newest first
///
/// Announcements are global, so there is no scope to be absent.
///
/// # Errors
/// [`RemoteFetchError`] if the remote read fails
pub async fn fetch_announcements(
    source: &dyn DataSource,
    filter: AnnouncementFilter,
) -> Result<Vec<Announcement>, RemoteFetchError> {
    let mut query = Select::from(Announcement::TABLE);
    if let Some(status) = filter.status {
        query = query.eq("status", status);
    }
    if let Some(audience) = filter.audience {
        query = query.contains("user_types", [audience.as_str()]);
    }
    query = query.order_by("created_at", Direction::Descending);
    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }

    select_records(source, query)
        .await
        .map_err(fetch_error::<Announcement>)
}

/// Publish an announcement
///
/// # Errors
/// [`MutationError::Validation`] before dispatch, or the remote write error
pub async fn create_announcement(
    source: &dyn DataSource,
    announcement: NewAnnouncement,
) -> Result<Announcement, MutationError> {
    let announcement = announcement.validate()?;
    insert_record(source, &announcement)
        .await
        .map_err(write_error::<Announcement>(WriteOp::Create))
}

/// Patch an announcement
///
/// # Errors
/// [`MutationError::Validation`] before dispatch, or the remote write error
pub async fn update_announcement(
    source: &dyn DataSource,
    id: AnnouncementId,
    patch: AnnouncementPatch,
) -> Result<Announcement, MutationError> {
    let patch = patch.validate()?;
    update_record(source, id, &patch)
        .await
        .map_err(write_error::<Announcement>(WriteOp::Update))
}

/// Delete an announcement and return it
///
/// # Errors
/// The remote write error
pub async fn delete_announcement(
    source: &dyn DataSource,
    id: AnnouncementId,
) -> Result<Announcement, MutationError> {
    delete_record(source, id)
        .await
        .map_err(write_error::<Announcement>(WriteOp::Delete))
}
