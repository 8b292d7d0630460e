//! In-app user notifications

use crate::ids::{NotificationId, UserId};
use crate::record::Record;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Notification row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Row id
    pub id: NotificationId,
    /// Recipient
    pub user_id: UserId,
    /// Headline
    pub title: String,
    /// Body
    pub message: String,
    /// Category tag (leave, announcement, ...)
    #[serde(default)]
    pub category: Option<String>,
    /// When the recipient opened it
    #[serde(default)]
    pub read_at: Option<Timestamp>,
    /// Delivery time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Notification {
    /// Check whether the recipient has read it
    #[inline]
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

impl Record for Notification {
    type Id = NotificationId;

    const TABLE: &'static str = "notifications";
    const ENTITY: &'static str = "notification";

    fn id(&self) -> NotificationId {
        self.id
    }
}

/// Patch marking notifications read
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotificationRead {
    /// Read time
    pub read_at: Timestamp,
}

impl NotificationRead {
    /// Mark read now
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        Self {
            read_at: Timestamp::now(),
        }
    }
}
