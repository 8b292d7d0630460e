//! Query keys of every dashboard query
//!
//! Each query's key starts with its scope key (`["offDays", site]`), so a
//! mutation invalidates every variant of a query for that scope by
//! invalidating the scope prefix. Absent scopes become the segment `none`.

use nadi_model::{AnnouncementFilter, AnnouncementStatus, ClosureRange, SiteId, UserId};
use nadi_query::QueryKey;

/// Leave balances of a user
#[must_use]
pub fn leave_balances(user: Option<UserId>) -> QueryKey {
    QueryKey::new("leaveBalances").with_opt(user)
}

/// Leave requests of a user
#[must_use]
pub fn leave_requests(user: Option<UserId>) -> QueryKey {
    QueryKey::new("leaveRequests").with_opt(user)
}

/// Every closure query of a site
#[must_use]
pub fn closures_scope(site: Option<SiteId>) -> QueryKey {
    QueryKey::new("offDays").with_opt(site)
}

/// Closures of a site within a range
#[must_use]
pub fn closures(site: Option<SiteId>, range: ClosureRange) -> QueryKey {
    closures_scope(site)
        .with_opt(range.from)
        .with_opt(range.until)
}

/// Every announcement query
#[must_use]
pub fn announcements_scope() -> QueryKey {
    QueryKey::new("announcements")
}

/// Announcements matching a filter
#[must_use]
pub fn announcements(filter: &AnnouncementFilter) -> QueryKey {
    announcements_scope()
        .with_opt(filter.status.map(AnnouncementStatus::as_str))
        .with_opt(filter.audience)
        .with_opt(filter.limit)
}

/// Staff roster of a site
#[must_use]
pub fn staff(site: Option<SiteId>) -> QueryKey {
    QueryKey::new("staff").with_opt(site)
}

/// Every notification query of a user
#[must_use]
pub fn notifications_scope(user: Option<UserId>) -> QueryKey {
    QueryKey::new("notifications").with_opt(user)
}

/// Notifications of a user
#[must_use]
pub fn notifications(user: Option<UserId>, unread_only: bool) -> QueryKey {
    notifications_scope(user).with(if unread_only { "unread" } else { "all" })
}

/// Inventory of a site
#[must_use]
pub fn inventory(site: Option<SiteId>) -> QueryKey {
    QueryKey::new("inventory").with_opt(site)
}

/// Payroll of a user for a year
#[must_use]
pub fn payroll(user: Option<UserId>, year: Option<i32>) -> QueryKey {
    QueryKey::new("payroll").with_opt(user).with_opt(year)
}
