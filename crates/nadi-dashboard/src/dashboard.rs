//! Dashboard facade
//!
//! Binds an [`AppContext`] to the signed-in [`Session`]. Read hooks return
//! [`QueryObserver`]s keyed by [`crate::keys`]; mutations check access,
//! run the mutation wrapper through the context's [`nadi_query::MutationRunner`]
//! and invalidate the scope of the entity they wrote.

use crate::context::AppContext;
use crate::error::MutationError;
use crate::keys;
use crate::queries;
use nadi_model::{
    Action, Announcement, AnnouncementFilter, AnnouncementId, AnnouncementPatch, ClosureId,
    ClosurePatch, ClosureRange, ClosureRecord, InventoryItem, LeaveBalance, LeaveRequest,
    LeaveRequestId, LeaveReview, NewAnnouncement, NewClosure, NewLeaveRequest, NewStaffMember,
    Notification, NotificationId, PayrollRecord, Session, SiteId, StaffId, StaffMember,
    StaffPatch, UserId,
};
use nadi_query::{QueryKey, QueryObserver};
use nadi_source::DataSource;
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;

/// Data access of one signed-in user
#[derive(Debug, Clone)]
pub struct Dashboard {
    context: AppContext,
    session: Session,
}

impl Dashboard {
    /// Bind `context` to `session`
    #[must_use]
    pub fn new(context: AppContext, session: Session) -> Self {
        Self { context, session }
    }

    /// Application context
    #[inline]
    #[must_use]
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Signed-in user
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn observe<T, E, Fut>(
        &self,
        key: QueryKey,
        failure_title: &str,
        fetch: impl Fn(Arc<dyn DataSource>) -> Fut + Send + Sync + 'static,
    ) -> QueryObserver<T>
    where
        T: Clone + Send + Sync + 'static,
        E: StdError + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let source = Arc::clone(self.context.source());
        QueryObserver::spawn(
            self.context.client(),
            Arc::clone(self.context.notifier()),
            key,
            failure_title,
            move || fetch(Arc::clone(&source)),
        )
    }

    /// Force a refetch of `key` and of every observer watching it
    pub async fn refetch(&self, key: &QueryKey) -> bool {
        self.context.client().invalidate_exact(key).await
    }

    // Read hooks

    /// Leave balances of `user`
    #[must_use]
    pub fn leave_balances(&self, user: Option<UserId>) -> QueryObserver<Vec<LeaveBalance>> {
        self.observe(
            keys::leave_balances(user),
            "Error loading leave balances",
            move |source| async move { queries::fetch_leave_balances(source.as_ref(), user).await },
        )
    }

    /// Leave requests of `user`
    #[must_use]
    pub fn leave_requests(&self, user: Option<UserId>) -> QueryObserver<Vec<LeaveRequest>> {
        self.observe(
            keys::leave_requests(user),
            "Error loading leave requests",
            move |source| async move { queries::fetch_leave_requests(source.as_ref(), user).await },
        )
    }

    /// Closures of `site` overlapping `range`
    #[must_use]
    pub fn closures(
        &self,
        site: Option<SiteId>,
        range: ClosureRange,
    ) -> QueryObserver<Vec<ClosureRecord>> {
        self.observe(
            keys::closures(site, range),
            "Error loading closures",
            move |source| async move {
                queries::fetch_closures(source.as_ref(), site, range).await
            },
        )
    }

    /// Announcements matching `filter`
    #[must_use]
    pub fn announcements(&self, filter: AnnouncementFilter) -> QueryObserver<Vec<Announcement>> {
        self.observe(
            keys::announcements(&filter),
            "Error loading announcements",
            move |source| async move {
                queries::fetch_announcements(source.as_ref(), filter).await
            },
        )
    }

    /// Staff roster of `site`
    #[must_use]
    pub fn staff(&self, site: Option<SiteId>) -> QueryObserver<Vec<StaffMember>> {
        self.observe(
            keys::staff(site),
            "Error loading staff",
            move |source| async move { queries::fetch_staff(source.as_ref(), site).await },
        )
    }

    /// Notifications of the signed-in user
    #[must_use]
    pub fn notifications(&self, unread_only: bool) -> QueryObserver<Vec<Notification>> {
        let user = Some(self.session.user_id);
        self.observe(
            keys::notifications(user, unread_only),
            "Error loading notifications",
            move |source| async move {
                queries::fetch_notifications(source.as_ref(), user, unread_only).await
            },
        )
    }

    /// Inventory of `site`
    #[must_use]
    pub fn inventory(&self, site: Option<SiteId>) -> QueryObserver<Vec<InventoryItem>> {
        self.observe(
            keys::inventory(site),
            "Error loading inventory",
            move |source| async move { queries::fetch_inventory(source.as_ref(), site).await },
        )
    }

    /// Payroll of `user`, optionally for one year
    #[must_use]
    pub fn payroll(
        &self,
        user: Option<UserId>,
        year: Option<i32>,
    ) -> QueryObserver<Vec<PayrollRecord>> {
        self.observe(
            keys::payroll(user, year),
            "Error loading payroll",
            move |source| async move { queries::fetch_payroll(source.as_ref(), user, year).await },
        )
    }

    // Closures

    /// Create a closure; the session user is recorded as creator unless set
    ///
    /// # Errors
    /// Authorization, validation or remote write failure
    pub async fn create_closure(
        &self,
        mut closure: NewClosure,
    ) -> Result<ClosureRecord, MutationError> {
        closure.created_by.get_or_insert(self.session.user_id);
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Closure created",
                async {
                    self.session.authorize(Action::ManageClosures)?;
                    queries::create_closure(source, closure).await
                },
                |created| vec![keys::closures_scope(Some(created.site_id))],
            )
            .await
    }

    /// Patch a closure
    ///
    /// # Errors
    /// Authorization, validation or remote write failure
    pub async fn update_closure(
        &self,
        id: ClosureId,
        patch: ClosurePatch,
    ) -> Result<ClosureRecord, MutationError> {
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Closure updated",
                async {
                    self.session.authorize(Action::ManageClosures)?;
                    queries::update_closure(source, id, patch).await
                },
                |updated| vec![keys::closures_scope(Some(updated.site_id))],
            )
            .await
    }

    /// Delete a closure
    ///
    /// # Errors
    /// Authorization or remote write failure
    pub async fn delete_closure(&self, id: ClosureId) -> Result<ClosureRecord, MutationError> {
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Closure deleted",
                async {
                    self.session.authorize(Action::ManageClosures)?;
                    queries::delete_closure(source, id).await
                },
                |deleted| vec![keys::closures_scope(Some(deleted.site_id))],
            )
            .await
    }

    // Announcements

    /// Publish an announcement; the session user is recorded as creator
    /// unless set
    ///
    /// # Errors
    /// Authorization, validation or remote write failure
    pub async fn create_announcement(
        &self,
        mut announcement: NewAnnouncement,
    ) -> Result<Announcement, MutationError> {
        announcement.created_by.get_or_insert(self.session.user_id);
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Announcement created",
                async {
                    self.session.authorize(Action::ManageAnnouncements)?;
                    queries::create_announcement(source, announcement).await
                },
                |_| vec![keys::announcements_scope()],
            )
            .await
    }

    /// Patch an announcement
    ///
    /// # Errors
    /// Authorization, validation or remote write failure
    pub async fn update_announcement(
        &self,
        id: AnnouncementId,
        patch: AnnouncementPatch,
    ) -> Result<Announcement, MutationError> {
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Announcement updated",
                async {
                    self.session.authorize(Action::ManageAnnouncements)?;
                    queries::update_announcement(source, id, patch).await
                },
                |_| vec![keys::announcements_scope()],
            )
            .await
    }

    /// Delete an announcement
    ///
    /// # Errors
    /// Authorization or remote write failure
    pub async fn delete_announcement(
        &self,
        id: AnnouncementId,
    ) -> Result<Announcement, MutationError> {
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Announcement deleted",
                async {
                    self.session.authorize(Action::ManageAnnouncements)?;
                    queries::delete_announcement(source, id).await
                },
                |_| vec![keys::announcements_scope()],
            )
            .await
    }

    // Staff

    /// Add a staff member
    ///
    /// # Errors
    /// Authorization, validation or remote write failure
    pub async fn create_staff_member(
        &self,
        member: NewStaffMember,
    ) -> Result<StaffMember, MutationError> {
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Staff member added",
                async {
                    self.session.authorize(Action::ManageStaff)?;
                    queries::create_staff_member(source, member).await
                },
                |created| vec![keys::staff(Some(created.site_id))],
            )
            .await
    }

    /// Patch a staff member
    ///
    /// # Errors
    /// Authorization, validation or remote write failure
    pub async fn update_staff_member(
        &self,
        id: StaffId,
        patch: StaffPatch,
    ) -> Result<StaffMember, MutationError> {
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Staff member updated",
                async {
                    self.session.authorize(Action::ManageStaff)?;
                    queries::update_staff_member(source, id, patch).await
                },
                |updated| vec![keys::staff(Some(updated.site_id))],
            )
            .await
    }

    /// Remove a staff member
    ///
    /// # Errors
    /// Authorization or remote write failure
    pub async fn delete_staff_member(&self, id: StaffId) -> Result<StaffMember, MutationError> {
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Staff member removed",
                async {
                    self.session.authorize(Action::ManageStaff)?;
                    queries::delete_staff_member(source, id).await
                },
                |deleted| vec![keys::staff(Some(deleted.site_id))],
            )
            .await
    }

    // Leave

    /// Submit a leave request for `request.user_id`
    ///
    /// # Errors
    /// Ownership, validation or remote write failure
    pub async fn submit_leave_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, MutationError> {
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Leave request submitted",
                async {
                    self.session.ensure_owner(request.user_id)?;
                    queries::submit_leave_request(source, request).await
                },
                leave_scope,
            )
            .await
    }

    /// Approve or reject a pending leave request
    ///
    /// # Errors
    /// Authorization or remote write failure
    pub async fn review_leave_request(
        &self,
        id: LeaveRequestId,
        approve: bool,
    ) -> Result<LeaveRequest, MutationError> {
        let source = self.context.source().as_ref();
        let review = LeaveReview::new(approve, self.session.user_id);
        self.context
            .runner()
            .run(
                if approve {
                    "Leave request approved"
                } else {
                    "Leave request rejected"
                },
                async {
                    self.session.authorize(Action::ReviewLeave)?;
                    queries::review_leave_request(source, id, review).await
                },
                leave_scope,
            )
            .await
    }

    /// Withdraw one of the session user's pending requests
    ///
    /// # Errors
    /// Remote write failure
    pub async fn cancel_leave_request(
        &self,
        id: LeaveRequestId,
    ) -> Result<LeaveRequest, MutationError> {
        let source = self.context.source().as_ref();
        self.context
            .runner()
            .run(
                "Leave request cancelled",
                queries::cancel_leave_request(source, self.session.user_id, id),
                leave_scope,
            )
            .await
    }

    // Notifications

    /// Mark one of the session user's notifications as read
    ///
    /// # Errors
    /// Remote write failure
    pub async fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> Result<Notification, MutationError> {
        let user = self.session.user_id;
        self.context
            .runner()
            .run(
                "Notification marked as read",
                queries::mark_notification_read(self.context.source().as_ref(), user, id),
                |_| vec![keys::notifications_scope(Some(user))],
            )
            .await
    }

    /// Mark every unread notification of the session user as read
    ///
    /// # Errors
    /// Remote write failure
    pub async fn mark_all_notifications_read(&self) -> Result<Vec<Notification>, MutationError> {
        let user = self.session.user_id;
        self.context
            .runner()
            .run(
                "All notifications marked as read",
                queries::mark_all_notifications_read(self.context.source().as_ref(), user),
                |_| vec![keys::notifications_scope(Some(user))],
            )
            .await
    }
}

/// Requests and balances of the request's owner; pending days count
/// against the balance
fn leave_scope(request: &LeaveRequest) -> Vec<QueryKey> {
    vec![
        keys::leave_requests(Some(request.user_id)),
        keys::leave_balances(Some(request.user_id)),
    ]
}
