//! Announcements
//!
//! Broadcast messages shown to selected user types during a validity window,
//! optionally carrying uploaded attachments.

use crate::access::UserType;
use crate::de::null_as_default;
use crate::error::ValidationError;
use crate::ids::{AnnouncementId, UserId};
use crate::record::Record;
use crate::timestamp::Timestamp;
use crate::validation::{require_order, require_text, Valid, Validate};
use crate::validation::{MAX_BODY_LEN, MAX_TITLE_LEN};
use serde::{Deserialize, Serialize};

/// Publication state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementStatus {
    /// Shown during its window
    #[default]
    Active,
    /// Hidden
    Inactive,
}

impl AnnouncementStatus {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl From<AnnouncementStatus> for serde_json::Value {
    fn from(status: AnnouncementStatus) -> Self {
        serde_json::Value::String(status.as_str().to_string())
    }
}

/// Uploaded file referenced by an announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name
    pub name: String,
    /// Storage path
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Announcement row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    /// Row id
    pub id: AnnouncementId,
    /// Headline
    pub title: String,
    /// Body
    pub message: String,
    /// Publication state
    pub status: AnnouncementStatus,
    /// Audience
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_types: Vec<UserType>,
    /// Visible from
    pub start_date: Timestamp,
    /// Visible until
    pub end_date: Timestamp,
    /// Uploaded files
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    /// Author
    #[serde(default)]
    pub created_by: Option<UserId>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Announcement {
    /// Check whether `user_type` should see this announcement at `at`
    #[must_use]
    pub fn is_visible_to(&self, user_type: UserType, at: Timestamp) -> bool {
        self.status == AnnouncementStatus::Active
            && self.user_types.contains(&user_type)
            && self.start_date <= at
            && at <= self.end_date
    }
}

impl Record for Announcement {
    type Id = AnnouncementId;

    const TABLE: &'static str = "announcements";
    const ENTITY: &'static str = "announcement";

    fn id(&self) -> AnnouncementId {
        self.id
    }
}

/// Payload for a new announcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnouncement {
    /// Headline
    pub title: String,
    /// Body
    pub message: String,
    /// Publication state
    #[serde(default)]
    pub status: AnnouncementStatus,
    /// Audience
    pub user_types: Vec<UserType>,
    /// Visible from
    pub start_date: Timestamp,
    /// Visible until
    pub end_date: Timestamp,
    /// Uploaded files
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl Validate for NewAnnouncement {
    fn validate(self) -> Result<Valid<Self>, ValidationError> {
        require_text("title", &self.title, MAX_TITLE_LEN)?;
        require_text("message", &self.message, MAX_BODY_LEN)?;
        if self.user_types.is_empty() {
            return Err(ValidationError::Missing {
                field: "user_types",
            });
        }
        require_order("start_date", &self.start_date, "end_date", &self.end_date)?;
        validate_attachments(&self.attachments)?;
        Ok(Valid::new(self))
    }
}

/// Partial update of an announcement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementPatch {
    /// New headline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// New state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AnnouncementStatus>,
    /// New audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_types: Option<Vec<UserType>>,
    /// New start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    /// New end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    /// Replacement attachment list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl Validate for AnnouncementPatch {
    fn validate(self) -> Result<Valid<Self>, ValidationError> {
        if self == Self::default() {
            return Err(ValidationError::invalid("announcement", "nothing to update"));
        }
        if let Some(title) = &self.title {
            require_text("title", title, MAX_TITLE_LEN)?;
        }
        if let Some(message) = &self.message {
            require_text("message", message, MAX_BODY_LEN)?;
        }
        if self.user_types.as_ref().is_some_and(Vec::is_empty) {
            return Err(ValidationError::Missing {
                field: "user_types",
            });
        }
        if let (Some(start), Some(end)) = (&self.start_date, &self.end_date) {
            require_order("start_date", start, "end_date", end)?;
        }
        if let Some(attachments) = &self.attachments {
            validate_attachments(attachments)?;
        }
        Ok(Valid::new(self))
    }
}

fn validate_attachments(attachments: &[Attachment]) -> Result<(), ValidationError> {
    for attachment in attachments {
        require_text("attachments.name", &attachment.name, MAX_TITLE_LEN)?;
        require_text("attachments.path", &attachment.path, MAX_BODY_LEN)?;
        if attachment.size == 0 {
            return Err(ValidationError::invalid("attachments.size", "file is empty"));
        }
    }
    Ok(())
}

/// Filter for announcement queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AnnouncementFilter {
    /// Only this publication state
    pub status: Option<AnnouncementStatus>,
    /// Only announcements addressed to this user type
    pub audience: Option<UserType>,
    /// Maximum rows
    pub limit: Option<usize>,
}

impl AnnouncementFilter {
    /// Active announcements for one audience
    #[inline]
    #[must_use]
    pub fn active_for(audience: UserType) -> Self {
        Self {
            status: Some(AnnouncementStatus::Active),
            audience: Some(audience),
            limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> Timestamp {
        raw.parse().unwrap()
    }

    fn payload() -> NewAnnouncement {
        NewAnnouncement {
            title: "System maintenance".to_string(),
            message: "The portal is offline on Saturday.".to_string(),
            status: AnnouncementStatus::Active,
            user_types: vec![UserType::Staff, UserType::Member],
            start_date: ts("2025-01-01"),
            end_date: ts("2025-01-31"),
            attachments: vec![Attachment {
                name: "notice.pdf".to_string(),
                path: "announcements/notice.pdf".to_string(),
                size: 2048,
                mime_type: "application/pdf".to_string(),
            }],
            created_by: None,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn audience_is_required() {
        let mut p = payload();
        p.user_types.clear();
        assert_eq!(
            p.validate().unwrap_err(),
            ValidationError::Missing {
                field: "user_types"
            }
        );
    }

    #[test]
    fn empty_attachment_is_rejected() {
        let mut p = payload();
        p.attachments[0].size = 0;
        assert_eq!(p.validate().unwrap_err().field(), "attachments.size");
    }

    #[test]
    fn window_is_checked() {
        let mut p = payload();
        p.end_date = ts("2024-12-31");
        assert!(matches!(
            p.validate(),
            Err(ValidationError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn visibility_follows_status_audience_and_window() {
        let announcement = Announcement {
            id: AnnouncementId::new(),
            title: "t".to_string(),
            message: "m".to_string(),
            status: AnnouncementStatus::Active,
            user_types: vec![UserType::Staff],
            start_date: ts("2025-01-01"),
            end_date: ts("2025-01-31"),
            attachments: Vec::new(),
            created_by: None,
            created_at: None,
        };
        assert!(announcement.is_visible_to(UserType::Staff, ts("2025-01-15")));
        assert!(!announcement.is_visible_to(UserType::Member, ts("2025-01-15")));
        assert!(!announcement.is_visible_to(UserType::Staff, ts("2025-02-15")));
    }

    #[test]
    fn attachment_type_field_is_renamed() {
        let json = serde_json::to_value(&payload().attachments[0]).unwrap();
        assert_eq!(json["type"], "application/pdf");
    }

    #[test]
    fn null_attachments_decode_as_empty() {
        let row = serde_json::json!({
            "id": AnnouncementId::new(),
            "title": "t",
            "message": "m",
            "status": "inactive",
            "user_types": ["staff"],
            "start_date": "2025-01-01",
            "end_date": "2025-01-02",
            "attachments": null
        });
        let announcement: Announcement = serde_json::from_value(row).unwrap();
        assert!(announcement.attachments.is_empty());
        assert_eq!(announcement.status, AnnouncementStatus::Inactive);
    }
}
