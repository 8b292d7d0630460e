//! NADI admin data model
//!
//! Rows of the hosted backend mirrored as transient view state. The remote
//! store is the single source of truth; nothing here is persisted locally.
//!
//! # Contents
//!
//! - Identifiers: UUID newtypes per entity ([`UserId`], [`SiteId`], ...)
//! - Entities: leave, closures, announcements, staff, notifications,
//!   inventory and payroll rows, each implementing [`Record`]
//! - Payloads: `New*` and `*Patch` types sent by mutation wrappers
//! - Validation: [`Validate`] turns a payload into [`Valid<T>`] before any
//!   remote dispatch
//! - Access: [`Session`] and [`Action`] checks producing [`AuthorizationError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use nadi_model::prelude::*;
//!
//! let closure = NewClosure::new(Some(site), "Maintenance", start, end);
//! let valid = closure.validate()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod access;
pub mod announcement;
pub mod closure;
pub mod error;
pub mod ids;
pub mod inventory;
pub mod leave;
pub mod notification;
pub mod payroll;
pub mod record;
pub mod staff;
pub mod timestamp;
pub mod validation;

mod de;

// Re-exports for convenience
pub use access::{Action, Session, UserType};
pub use announcement::{
    Announcement, AnnouncementFilter, AnnouncementPatch, AnnouncementStatus, Attachment,
    NewAnnouncement,
};
pub use closure::{ClosurePatch, ClosureRange, ClosureRecord, NewClosure, RecurrencePattern};
pub use error::{AuthorizationError, ValidationError};
pub use ids::{
    AnnouncementId, ClosureId, InventoryItemId, LeaveBalanceId, LeaveRequestId, LeaveTypeId,
    NotificationId, PayrollId, SiteId, StaffId, UserId,
};
pub use inventory::InventoryItem;
pub use leave::{
    LeaveBalance, LeaveRequest, LeaveRequestInsert, LeaveReview, LeaveStatus, NewLeaveRequest,
};
pub use notification::{Notification, NotificationRead};
pub use payroll::{PayrollRecord, PayrollStatus};
pub use record::Record;
pub use staff::{NewStaffMember, StaffMember, StaffPatch, StaffStatus};
pub use timestamp::{Timestamp, TimestampError};
pub use validation::{Valid, Validate};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the data model
    pub use crate::access::{Action, Session, UserType};
    pub use crate::error::{AuthorizationError, ValidationError};
    pub use crate::ids::{SiteId, UserId};
    pub use crate::record::Record;
    pub use crate::timestamp::Timestamp;
    pub use crate::validation::{Valid, Validate};
    pub use crate::{
        Announcement, ClosureRecord, LeaveBalance, LeaveRequest, NewAnnouncement, NewClosure,
        NewLeaveRequest, NewStaffMember, StaffMember,
    };
}
