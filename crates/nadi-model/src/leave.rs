//! Leave balances and leave requests

use crate::error::ValidationError;
use crate::ids::{LeaveBalanceId, LeaveRequestId, LeaveTypeId, UserId};
use crate::record::Record;
use crate::timestamp::Timestamp;
use crate::validation::{check_length, require_order, Valid, Validate, MAX_BODY_LEN};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tolerance when comparing day counts (half days are common)
const DAY_EPSILON: f64 = 1e-6;

/// Leave balance of one user for one leave type
///
/// The backend maintains `remaining = total - used - pending`; this layer
/// never recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// Row id
    pub id: LeaveBalanceId,
    /// Owning user
    pub user_id: UserId,
    /// Leave type reference
    pub leave_type_id: LeaveTypeId,
    /// Leave type label
    pub leave_type: String,
    /// Entitlement for the period
    pub total_days: f64,
    /// Days already taken
    pub used_days: f64,
    /// Days requested but not yet approved
    pub pending_days: f64,
    /// Days still available
    pub remaining_days: f64,
}

impl LeaveBalance {
    /// Check the backend-maintained balance invariant
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let expected = self.total_days - self.used_days - self.pending_days;
        (expected - self.remaining_days).abs() < DAY_EPSILON
    }
}

impl Record for LeaveBalance {
    type Id = LeaveBalanceId;

    const TABLE: &'static str = "leave_balances";
    const ENTITY: &'static str = "leave balance";

    fn id(&self) -> LeaveBalanceId {
        self.id
    }
}

/// Lifecycle of a leave request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Awaiting review
    Pending,
    /// Approved by a reviewer
    Approved,
    /// Rejected by a reviewer
    Rejected,
    /// Withdrawn by the requester
    Cancelled,
}

impl LeaveStatus {
    /// Backend label
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<LeaveStatus> for serde_json::Value {
    fn from(status: LeaveStatus) -> Self {
        serde_json::Value::String(status.as_str().to_string())
    }
}

/// Leave request row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Row id
    pub id: LeaveRequestId,
    /// Requester
    pub user_id: UserId,
    /// Leave type reference
    pub leave_type_id: LeaveTypeId,
    /// First day off
    pub start_date: NaiveDate,
    /// Last day off
    pub end_date: NaiveDate,
    /// Working days requested
    pub days: f64,
    /// Free text reason
    #[serde(default)]
    pub reason: Option<String>,
    /// Review state
    pub status: LeaveStatus,
    /// Reviewer
    #[serde(default)]
    pub reviewed_by: Option<UserId>,
    /// Review time
    #[serde(default)]
    pub reviewed_at: Option<Timestamp>,
    /// Submission time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Record for LeaveRequest {
    type Id = LeaveRequestId;

    const TABLE: &'static str = "leave_requests";
    const ENTITY: &'static str = "leave request";

    fn id(&self) -> LeaveRequestId {
        self.id
    }
}

/// Payload for a new leave request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLeaveRequest {
    /// Requester
    pub user_id: UserId,
    /// Leave type reference
    pub leave_type_id: LeaveTypeId,
    /// First day off
    pub start_date: NaiveDate,
    /// Last day off
    pub end_date: NaiveDate,
    /// Working days requested
    pub days: f64,
    /// Free text reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl NewLeaveRequest {
    /// Calendar days covered by the request, inclusive
    #[must_use]
    pub fn calendar_span(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

impl Validate for NewLeaveRequest {
    fn validate(self) -> Result<Valid<Self>, ValidationError> {
        require_order("start_date", &self.start_date, "end_date", &self.end_date)?;
        if self.days.is_nan() || self.days <= 0.0 {
            return Err(ValidationError::invalid("days", "must be positive"));
        }
        #[allow(clippy::cast_precision_loss)]
        let span = self.calendar_span() as f64;
        if self.days > span + DAY_EPSILON {
            return Err(ValidationError::invalid(
                "days",
                format!("{} days do not fit in a {span}-day window", self.days),
            ));
        }
        if let Some(reason) = &self.reason {
            check_length("reason", reason, MAX_BODY_LEN)?;
        }
        Ok(Valid::new(self))
    }
}

/// Insert body for a leave request; new requests always start pending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveRequestInsert {
    /// Validated request fields
    #[serde(flatten)]
    pub request: NewLeaveRequest,
    /// Initial status
    pub status: LeaveStatus,
}

impl LeaveRequestInsert {
    /// Build the insert body for a validated request
    #[must_use]
    pub fn pending(request: Valid<NewLeaveRequest>) -> Self {
        Self {
            request: request.into_inner(),
            status: LeaveStatus::Pending,
        }
    }
}

/// Reviewer decision on a pending request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveReview {
    /// Approved or rejected
    pub status: LeaveStatus,
    /// Reviewer
    pub reviewed_by: UserId,
    /// Decision time
    pub reviewed_at: Timestamp,
}

impl LeaveReview {
    /// Create a decision stamped now
    #[must_use]
    pub fn new(approve: bool, reviewer: UserId) -> Self {
        Self {
            status: if approve {
                LeaveStatus::Approved
            } else {
                LeaveStatus::Rejected
            },
            reviewed_by: reviewer,
            reviewed_at: Timestamp::now(),
        }
    }
}

impl Validate for LeaveReview {
    fn validate(self) -> Result<Valid<Self>, ValidationError> {
        match self.status {
            LeaveStatus::Approved | LeaveStatus::Rejected => Ok(Valid::new(self)),
            other => Err(ValidationError::invalid(
                "status",
                format!("a review cannot set status '{}'", other.as_str()),
            )),
        }
    }
}
