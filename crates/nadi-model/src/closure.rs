//! Site closures (off-days)
//!
//! A closure marks a window during which a NADI site is shut, optionally
//! repeating on a fixed pattern.

use crate::de::null_as_default;
use crate::error::ValidationError;
use crate::ids::{ClosureId, SiteId, UserId};
use crate::record::Record;
use crate::timestamp::Timestamp;
use crate::validation::{check_length, require, require_order, require_text, Valid, Validate};
use crate::validation::{MAX_BODY_LEN, MAX_TITLE_LEN};
use serde::{Deserialize, Serialize};

/// Repetition of a recurring closure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    /// Every day
    Daily,
    /// Same weekday every week
    Weekly,
    /// Same day every month
    Monthly,
    /// Same date every year
    Yearly,
}

/// Closure row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureRecord {
    /// Row id
    pub id: ClosureId,
    /// Owning site
    pub site_id: SiteId,
    /// Short title shown on the calendar
    pub title: String,
    /// First closed moment
    pub start_date: Timestamp,
    /// Last closed moment
    pub end_date: Timestamp,
    /// Whether the window repeats
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_recurring: bool,
    /// Repetition, present for recurring closures
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// Free text
    #[serde(default)]
    pub description: Option<String>,
    /// Author
    #[serde(default)]
    pub created_by: Option<UserId>,
}

impl ClosureRecord {
    /// Check whether `at` falls inside the closure window
    #[inline]
    #[must_use]
    pub fn covers(&self, at: Timestamp) -> bool {
        self.start_date <= at && at <= self.end_date
    }

    /// Number of calendar days touched by the window
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.end_date.date() - self.start_date.date()).num_days() + 1
    }
}

impl Record for ClosureRecord {
    type Id = ClosureId;

    const TABLE: &'static str = "nd_closures";
    const ENTITY: &'static str = "closure";

    fn id(&self) -> ClosureId {
        self.id
    }
}

/// Payload for a new closure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClosure {
    /// Owning site; `None` when no site is selected in the form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<SiteId>,
    /// Short title
    pub title: String,
    /// Window start
    pub start_date: Timestamp,
    /// Window end
    pub end_date: Timestamp,
    /// Whether the window repeats
    #[serde(default)]
    pub is_recurring: bool,
    /// Repetition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// Free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl NewClosure {
    /// Create a one-off closure payload
    #[must_use]
    pub fn new(
        site_id: Option<SiteId>,
        title: impl Into<String>,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> Self {
        Self {
            site_id,
            title: title.into(),
            start_date,
            end_date,
            is_recurring: false,
            recurrence_pattern: None,
            description: None,
            created_by: None,
        }
    }

    /// Make the closure repeat
    #[inline]
    #[must_use]
    pub fn recurring(mut self, pattern: RecurrencePattern) -> Self {
        self.is_recurring = true;
        self.recurrence_pattern = Some(pattern);
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With author
    #[inline]
    #[must_use]
    pub fn created_by(mut self, user: UserId) -> Self {
        self.created_by = Some(user);
        self
    }
}

impl Validate for NewClosure {
    fn validate(mut self) -> Result<Valid<Self>, ValidationError> {
        require("site_id", self.site_id.as_ref())?;
        require_text("title", &self.title, MAX_TITLE_LEN)?;
        require_order("start_date", &self.start_date, "end_date", &self.end_date)?;
        if self.is_recurring {
            require("recurrence_pattern", self.recurrence_pattern.as_ref())?;
        } else {
            self.recurrence_pattern = None;
        }
        if let Some(description) = &self.description {
            check_length("description", description, MAX_BODY_LEN)?;
        }
        self.title = self.title.trim().to_string();
        Ok(Valid::new(self))
    }
}

/// Partial update of a closure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClosurePatch {
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    /// New end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    /// New recurrence flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
    /// New recurrence pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ClosurePatch {
    /// Check whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Validate for ClosurePatch {
    /// Checks the fields the patch carries. The window is only compared when
    /// both ends are present, since the stored row is not read back first.
    fn validate(self) -> Result<Valid<Self>, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::invalid("closure", "nothing to update"));
        }
        if let Some(title) = &self.title {
            require_text("title", title, MAX_TITLE_LEN)?;
        }
        if let (Some(start), Some(end)) = (&self.start_date, &self.end_date) {
            require_order("start_date", start, "end_date", end)?;
        }
        if self.is_recurring == Some(true) {
            require("recurrence_pattern", self.recurrence_pattern.as_ref())?;
        }
        if let Some(description) = &self.description {
            check_length("description", description, MAX_BODY_LEN)?;
        }
        Ok(Valid::new(self))
    }
}

/// Window filter for closure queries
///
/// Selects closures overlapping `[from, until]`; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClosureRange {
    /// Earliest moment of interest
    pub from: Option<Timestamp>,
    /// Latest moment of interest
    pub until: Option<Timestamp>,
}

impl ClosureRange {
    /// Unbounded range
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Range between two moments
    #[inline]
    #[must_use]
    pub fn between(from: Timestamp, until: Timestamp) -> Self {
        Self {
            from: Some(from),
            until: Some(until),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(raw: &str) -> Timestamp {
        raw.parse().unwrap()
    }

    fn closure(start: &str, end: &str) -> NewClosure {
        NewClosure::new(Some(SiteId::new()), "Public holiday", ts(start), ts(end))
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = closure("2025-01-10", "2025-01-05").validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::EndBeforeStart {
                end_field: "end_date",
                ..
            }
        ));
    }

    #[test]
    fn single_day_closure_is_valid() {
        let valid = closure("2025-01-10", "2025-01-10").validate().unwrap();
        assert_eq!(valid.title, "Public holiday");
    }

    #[test]
    fn missing_site_is_rejected() {
        let mut payload = closure("2025-01-01", "2025-01-02");
        payload.site_id = None;
        assert_eq!(
            payload.validate().unwrap_err(),
            ValidationError::Missing { field: "site_id" }
        );
    }

    #[test]
    fn recurring_requires_pattern() {
        let mut payload = closure("2025-01-01", "2025-01-02");
        payload.is_recurring = true;
        assert_eq!(
            payload.validate().unwrap_err(),
            ValidationError::Missing {
                field: "recurrence_pattern"
            }
        );

        let weekly = closure("2025-01-01", "2025-01-02").recurring(RecurrencePattern::Weekly);
        assert!(weekly.validate().is_ok());
    }

    #[test]
    fn non_recurring_drops_stray_pattern() {
        let mut payload = closure("2025-01-01", "2025-01-02");
        payload.recurrence_pattern = Some(RecurrencePattern::Daily);
        let valid = payload.validate().unwrap();
        assert_eq!(valid.recurrence_pattern, None);
    }

    #[test]
    fn patch_checks_window_only_with_both_ends() {
        let only_end = ClosurePatch {
            end_date: Some(ts("2020-01-01")),
            ..ClosurePatch::default()
        };
        assert!(only_end.validate().is_ok());

        let inverted = ClosurePatch {
            start_date: Some(ts("2025-02-02")),
            end_date: Some(ts("2025-02-01")),
            ..ClosurePatch::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(ClosurePatch::default().validate().is_err());
    }

    #[test]
    fn record_decodes_backend_row() {
        let row = serde_json::json!({
            "id": ClosureId::new(),
            "site_id": SiteId::new(),
            "title": "Raya",
            "start_date": "2025-03-31",
            "end_date": "2025-04-01T23:59:59+00:00",
            "is_recurring": null,
            "recurrence_pattern": null,
            "description": null
        });
        let record: ClosureRecord = serde_json::from_value(row).unwrap();
        assert!(!record.is_recurring);
        assert_eq!(record.span_days(), 2);
        assert!(record.covers(ts("2025-04-01T12:00:00Z")));
        assert!(!record.covers(ts("2025-04-02")));
    }

    #[test]
    fn new_closure_omits_absent_fields() {
        let json = serde_json::to_value(closure("2025-01-01", "2025-01-02")).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("description"));
        assert!(!object.contains_key("recurrence_pattern"));
        assert_eq!(object["start_date"], "2025-01-01T00:00:00Z");
    }

    proptest! {
        #[test]
        fn window_validates_iff_ordered(start in 0i64..20_000, end in 0i64..20_000) {
            let base = chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
            let start_date = Timestamp::from(base + chrono::Duration::days(start));
            let end_date = Timestamp::from(base + chrono::Duration::days(end));
            let payload = NewClosure::new(Some(SiteId::new()), "Closure", start_date, end_date);
            prop_assert_eq!(payload.validate().is_ok(), end >= start);
        }
    }
}
