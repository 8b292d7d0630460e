//! Entity identifiers
//!
//! Every backend row is keyed by a UUID. Each entity gets its own newtype so a
//! site id can never be passed where a user id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID
            #[inline]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the underlying UUID
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for serde_json::Value {
            fn from(id: $name) -> Self {
                serde_json::Value::String(id.0.to_string())
            }
        }
    };
}

entity_id!(
    /// Authenticated user (backend auth user id)
    UserId
);
entity_id!(
    /// NADI site (centre) that owns closures, staff and inventory
    SiteId
);
entity_id!(
    /// Leave balance row
    LeaveBalanceId
);
entity_id!(
    /// Leave type (annual, medical, ...)
    LeaveTypeId
);
entity_id!(
    /// Leave request row
    LeaveRequestId
);
entity_id!(
    /// Site closure (off-day) row
    ClosureId
);
entity_id!(
    /// Announcement row
    AnnouncementId
);
entity_id!(
    /// Staff roster row
    StaffId
);
entity_id!(
    /// User notification row
    NotificationId
);
entity_id!(
    /// Inventory item row
    InventoryItemId
);
entity_id!(
    /// Payroll record row
    PayrollId
);
