//! Query and mutation wrappers
//!
//! Every wrapper takes the data source explicitly and performs at most one
//! remote operation:
//!
//! - query wrappers return rows or a [`RemoteFetchError`]; an absent scope
//!   returns an empty list without touching the source, and zero matching
//!   rows is an empty list, never an error
//! - mutation wrappers validate first, then return the written entity or a
//!   [`MutationError`]
//!
//! Caching, invalidation and notifications are layered on top by
//! [`crate::Dashboard`].

mod announcements;
mod closures;
mod inventory;
mod leave;
mod notifications;
mod payroll;
mod staff;

pub use announcements::{
    create_announcement, delete_announcement, fetch_announcements, update_announcement,
};
pub use closures::{create_closure, delete_closure, fetch_closures, update_closure};
pub use inventory::fetch_inventory;
pub use leave::{
    cancel_leave_request, fetch_leave_balances, fetch_leave_requests, review_leave_request,
    submit_leave_request,
};
pub use notifications::{fetch_notifications, mark_all_notifications_read, mark_notification_read};
pub use payroll::fetch_payroll;
pub use staff::{create_staff_member, delete_staff_member, fetch_staff, update_staff_member};

use crate::error::{MutationError, RemoteFetchError, RemoteWriteError, WriteOp};
use nadi_model::Record;
use nadi_source::RemoteError;

pub(crate) fn fetch_error<R: Record>(source: RemoteError) -> RemoteFetchError {
    tracing::warn!(entity = R::ENTITY, error = %source, "remote read failed");
    RemoteFetchError {
        entity: R::ENTITY,
        source,
    }
}

pub(crate) fn write_error<R: Record>(op: WriteOp) -> impl FnOnce(RemoteError) -> MutationError {
    move |source| {
        tracing::warn!(entity = R::ENTITY, %op, error = %source, "remote write failed");
        MutationError::Write(RemoteWriteError {
            entity: R::ENTITY,
            op,
            source,
        })
    }
}
