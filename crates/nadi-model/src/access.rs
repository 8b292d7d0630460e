//! Session roles and action checks
//!
//! Authentication itself belongs to the backend platform. This module only
//! answers "may this signed-in user do that" for the mutations the dashboard
//! exposes.

use crate::error::AuthorizationError;
use crate::ids::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// User type as stored on the backend profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// Platform administrator
    SuperAdmin,
    /// Site staff
    Staff,
    /// Registered member
    Member,
    /// Vendor account
    Vendor,
    /// Technology partner
    TechPartner,
    /// DUSP operator
    Dusp,
    /// SSO account
    Sso,
}

impl UserType {
    /// All user types, in display order
    pub const ALL: [UserType; 7] = [
        UserType::SuperAdmin,
        UserType::Staff,
        UserType::Member,
        UserType::Vendor,
        UserType::TechPartner,
        UserType::Dusp,
        UserType::Sso,
    ];

    /// Backend label
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Staff => "staff",
            Self::Member => "member",
            Self::Vendor => "vendor",
            Self::TechPartner => "tech_partner",
            Self::Dusp => "dusp",
            Self::Sso => "sso",
        }
    }

    /// Check whether this user type may perform `action`
    #[must_use]
    pub fn permits(self, action: Action) -> bool {
        match self {
            Self::SuperAdmin => true,
            Self::Staff => matches!(action, Action::ManageClosures),
            Self::Member | Self::Vendor | Self::TechPartner | Self::Dusp | Self::Sso => false,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown user type: {s}"))
    }
}

/// Privileged dashboard action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create, edit or delete announcements
    ManageAnnouncements,
    /// Create, edit or delete site closures
    ManageClosures,
    /// Create, edit or delete staff roster entries
    ManageStaff,
    /// Approve or reject leave requests
    ReviewLeave,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ManageAnnouncements => "manage announcements",
            Self::ManageClosures => "manage closures",
            Self::ManageStaff => "manage staff",
            Self::ReviewLeave => "review leave",
        })
    }
}

/// Signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend auth user id
    pub user_id: UserId,
    /// Profile user type
    pub user_type: UserType,
}

impl Session {
    /// Create new session
    #[inline]
    #[must_use]
    pub fn new(user_id: UserId, user_type: UserType) -> Self {
        Self { user_id, user_type }
    }

    /// Check that the session may perform `action`
    ///
    /// # Errors
    /// Returns [`AuthorizationError::Forbidden`] when the user type lacks the permission
    pub fn authorize(&self, action: Action) -> Result<(), AuthorizationError> {
        if self.user_type.permits(action) {
            Ok(())
        } else {
            Err(AuthorizationError::Forbidden {
                user_type: self.user_type,
                action,
            })
        }
    }

    /// Check that the session may act on `target`'s own records
    ///
    /// Super admins may act on behalf of anyone.
    ///
    /// # Errors
    /// Returns [`AuthorizationError::NotOwner`] for someone else's records
    pub fn ensure_owner(&self, target: UserId) -> Result<(), AuthorizationError> {
        if self.user_id == target || self.user_type == UserType::SuperAdmin {
            Ok(())
        } else {
            Err(AuthorizationError::NotOwner { target })
        }
    }
}
