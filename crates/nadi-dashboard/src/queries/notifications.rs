use super::{fetch_error, write_error};
use crate::error::{MutationError, RemoteFetchError, WriteOp};
use nadi_model::{Notification, NotificationId, NotificationRead, Record, UserId};
use nadi_source::{
    select_records, update_all, update_matching, DataSource, Direction, Filter, FilterOp, Select,
};

/// Notifications of `user`, newest first
///
/// # Errors
/// [`RemoteFetchError`] if the remote read fails
pub async fn fetch_notifications(
    source: &dyn DataSource,
    user: Option<UserId>,
    unread_only: bool,
) -> Result<Vec<Notification>, RemoteFetchError> {
    let Some(user) = user else {
        return Ok(Vec::new());
    };

    let mut query = Select::from(Notification::TABLE).eq("user_id", user);
    if unread_only {
        query = query.is_null("read_at");
    }
    select_records(source, query.order_by("created_at", Direction::Descending))
        .await
        .map_err(fetch_error::<Notification>)
}

/// Mark one of `user`'s notifications as read
///
/// # Errors
/// The remote write error; a notification of another user is reported as
/// not found
pub async fn mark_notification_read(
    source: &dyn DataSource,
    user: UserId,
    id: NotificationId,
) -> Result<Notification, MutationError> {
    update_matching(
        source,
        &[Filter::eq("id", id), Filter::eq("user_id", user)],
        &NotificationRead::now(),
    )
    .await
    .map_err(write_error::<Notification>(WriteOp::Update))
}

/// Mark every unread notification of `user` as read
///
/// Returns the notifications that changed; none is not an error.
///
/// # Errors
/// The remote write error
pub async fn mark_all_notifications_read(
    source: &dyn DataSource,
    user: UserId,
) -> Result<Vec<Notification>, MutationError> {
    update_all(
        source,
        &[
            Filter::eq("user_id", user),
            Filter::new("read_at", FilterOp::IsNull),
        ],
        &NotificationRead::now(),
    )
    .await
    .map_err(write_error::<Notification>(WriteOp::Update))
}
