//! Site staff roster

use crate::error::ValidationError;
use crate::ids::{SiteId, StaffId};
use crate::record::Record;
use crate::validation::{require, require_email, require_phone, require_text, Valid, Validate};
use crate::validation::MAX_TITLE_LEN;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Employment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    /// Working
    #[default]
    Active,
    /// Temporarily away
    OnLeave,
    /// No longer employed
    Inactive,
}

/// Staff roster row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    /// Row id
    pub id: StaffId,
    /// Site the member works at
    pub site_id: SiteId,
    /// Full name
    pub name: String,
    /// Work e-mail
    pub email: String,
    /// Contact number
    #[serde(default)]
    pub phone: Option<String>,
    /// First working day
    pub employment_date: NaiveDate,
    /// Employment state
    pub status: StaffStatus,
    /// Position at the site
    pub role: String,
}

impl Record for StaffMember {
    type Id = StaffId;

    const TABLE: &'static str = "nd_staff";
    const ENTITY: &'static str = "staff member";

    fn id(&self) -> StaffId {
        self.id
    }
}

/// Payload for a new staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStaffMember {
    /// Site; `None` when no site is selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<SiteId>,
    /// Full name
    pub name: String,
    /// Work e-mail
    pub email: String,
    /// Contact number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// First working day
    pub employment_date: NaiveDate,
    /// Employment state
    #[serde(default)]
    pub status: StaffStatus,
    /// Position at the site
    pub role: String,
}

impl Validate for NewStaffMember {
    fn validate(mut self) -> Result<Valid<Self>, ValidationError> {
        require("site_id", self.site_id.as_ref())?;
        require_text("name", &self.name, MAX_TITLE_LEN)?;
        require_email("email", &self.email)?;
        if let Some(phone) = &self.phone {
            require_phone("phone", phone)?;
        }
        require_text("role", &self.role, MAX_TITLE_LEN)?;
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        Ok(Valid::new(self))
    }
}

/// Partial update of a staff member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffPatch {
    /// New name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New e-mail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New contact number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StaffStatus>,
    /// New position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Validate for StaffPatch {
    fn validate(mut self) -> Result<Valid<Self>, ValidationError> {
        if self == Self::default() {
            return Err(ValidationError::invalid("staff member", "nothing to update"));
        }
        if let Some(name) = &self.name {
            require_text("name", name, MAX_TITLE_LEN)?;
        }
        if let Some(email) = self.email.take() {
            require_email("email", &email)?;
            self.email = Some(email.trim().to_lowercase());
        }
        if let Some(phone) = &self.phone {
            require_phone("phone", phone)?;
        }
        if let Some(role) = &self.role {
            require_text("role", role, MAX_TITLE_LEN)?;
        }
        Ok(Valid::new(self))
    }
}
