use super::{fetch_error, write_error};
use crate::error::{MutationError, RemoteFetchError, WriteOp};
use nadi_model::{
    LeaveBalance, LeaveRequest, LeaveRequestId, LeaveRequestInsert, LeaveReview, LeaveStatus,
    NewLeaveRequest, Record, UserId, Validate,
};
use nadi_source::{
    insert_record, select_records, update_matching, DataSource, Direction, Filter, Select,
};
use serde::Serialize;

#[derive(Serialize)]
struct StatusPatch {
    status: LeaveStatus,
}

/// Leave balances of `user`, one per leave type
///
/// Balances whose `remaining` disagrees with `total - used - pending` are
/// returned unchanged and logged.
///
/// # Errors
/// [`RemoteFetchError`] if the remote read fails
pub async fn fetch_leave_balances(
    source: &dyn DataSource,
    user: Option<UserId>,
) -> Result<Vec<LeaveBalance>, RemoteFetchError> {
    let Some(user) = user else {
        return Ok(Vec::new());
    };

    let balances: Vec<LeaveBalance> = select_records(
        source,
        Select::from(LeaveBalance::TABLE)
            .eq("user_id", user)
            .order_by("leave_type", Direction::Ascending),
    )
    .await
    .map_err(fetch_error::<LeaveBalance>)?;

    for balance in balances.iter().filter(|b| !b.is_consistent()) {
        tracing::warn!(
            id = %balance.id,
            leave_type = %balance.leave_type,
            remaining = balance.remaining_days,
            "leave balance does not add up"
        );
    }
    Ok(balances)
}

/// Leave requests of `user`, newest first
///
/// # Errors
/// [`RemoteFetchError`] if the remote read fails
pub async fn fetch_leave_requests(
    source: &dyn DataSource,
    user: Option<UserId>,
) -> Result<Vec<LeaveRequest>, RemoteFetchError> {
    let Some(user) = user else {
        return Ok(Vec::new());
    };
    select_records(
        source,
        Select::from(LeaveRequest::TABLE)
            .eq("user_id", user)
            .order_by("start_date", Direction::Descending),
    )
    .await
    .map_err(fetch_error::<LeaveRequest>)
}

/// Submit a new pending leave request
///
/// # Errors
/// [`MutationError::Validation`] before dispatch, or the remote write error
pub async fn submit_leave_request(
    source: &dyn DataSource,
    request: NewLeaveRequest,
) -> Result<LeaveRequest, MutationError> {
    let insert = LeaveRequestInsert::pending(request.validate()?);
    insert_record(source, &insert)
        .await
        .map_err(write_error::<LeaveRequest>(WriteOp::Create))
}

/// Approve or reject a pending request
///
/// A request that is no longer pending is reported as not found.
///
/// # Errors
/// [`MutationError::Validation`] before dispatch, or the remote write error
pub async fn review_leave_request(
    source: &dyn DataSource,
    id: LeaveRequestId,
    review: LeaveReview,
) -> Result<LeaveRequest, MutationError> {
    let review = review.validate()?;
    update_matching(
        source,
        &[
            Filter::eq("id", id),
            Filter::eq("status", LeaveStatus::Pending),
        ],
        &review,
    )
    .await
    .map_err(write_error::<LeaveRequest>(WriteOp::Update))
}

/// Withdraw one of `user`'s own pending requests
///
/// # Errors
/// The remote write error; a request of another user or one that is no
/// longer pending is reported as not found
pub async fn cancel_leave_request(
    source: &dyn DataSource,
    user: UserId,
    id: LeaveRequestId,
) -> Result<LeaveRequest, MutationError> {
    update_matching(
        source,
        &[
            Filter::eq("id", id),
            Filter::eq("user_id", user),
            Filter::eq("status", LeaveStatus::Pending),
        ],
        &StatusPatch {
            status: LeaveStatus::Cancelled,
        },
    )
    .await
    .map_err(write_error::<LeaveRequest>(WriteOp::Update))
}
