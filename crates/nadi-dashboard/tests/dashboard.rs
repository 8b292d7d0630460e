//! Dashboard observers and mutations over one application context

use mockall::mock;
use nadi_dashboard::{AppContext, Dashboard, MutationError};
use nadi_model::{
    AnnouncementFilter, AnnouncementStatus, AuthorizationError, ClosureRange, LeaveTypeId,
    NewAnnouncement, NewClosure, NewLeaveRequest, Session, SiteId, UserId, UserType,
};
use nadi_query::{Notifier, QueryClient, QueryStatus, Toast};
use nadi_source::InMemorySource;
use nadi_test_utils::{
    backend_error, closure, date, leave_balance, notification, ts, Op, RecordingNotifier,
    ScriptedSource,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Harness {
    source: Arc<ScriptedSource>,
    toasts: Arc<RecordingNotifier>,
    context: AppContext,
}

impl Harness {
    fn new(inner: InMemorySource) -> Self {
        let source = Arc::new(ScriptedSource::new(inner));
        let toasts = RecordingNotifier::new();
        let context = AppContext::new(source.clone(), QueryClient::default(), toasts.clone());
        Self {
            source,
            toasts,
            context,
        }
    }

    fn dashboard(&self, user_type: UserType) -> Dashboard {
        Dashboard::new(self.context.clone(), Session::new(UserId::new(), user_type))
    }
}

#[tokio::test]
async fn observer_loads_scope_and_absent_scope_is_empty() {
    let site = SiteId::new();
    let harness = Harness::new(
        InMemorySource::new()
            .with_records(&[closure(site, "Raya", "2025-03-30", "2025-04-01")])
            .unwrap(),
    );
    let dashboard = harness.dashboard(UserType::Staff);

    let mut scoped = dashboard.closures(Some(site), ClosureRange::all());
    let view = scoped.settled().await;
    assert_eq!(view.status, QueryStatus::Success);
    assert_eq!(view.data.unwrap().len(), 1);

    let mut unscoped = dashboard.closures(None, ClosureRange::all());
    let view = unscoped.settled().await;
    assert_eq!(view.data, Some(Vec::new()));
    assert!(view.error.is_none());

    assert_eq!(harness.source.calls(Op::Select), 1);
    assert!(harness.toasts.toasts().is_empty());
}

#[tokio::test]
async fn failed_load_sends_exactly_one_toast() {
    let harness = Harness::new(InMemorySource::new());
    harness
        .source
        .fail(Op::Select, backend_error("relation \"leave_balances\" does not exist"));
    let dashboard = harness.dashboard(UserType::Member);

    let mut balances = dashboard.leave_balances(Some(dashboard.session().user_id));
    let view = balances.settled().await;

    assert_eq!(view.status, QueryStatus::Error);
    assert!(view.data.is_none());
    let error = view.error.unwrap();
    assert!(error.to_string().contains("failed to load leave balance"));

    let toasts = harness.toasts.destructive();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Error loading leave balances");
}

#[tokio::test]
async fn observers_of_one_key_share_a_single_fetch() {
    let me = UserId::new();
    let harness = Harness::new(
        InMemorySource::new()
            .with_records(&[leave_balance(me, "Annual", 16.0, 2.0, 0.0)])
            .unwrap(),
    );
    let dashboard = harness.dashboard(UserType::Member);
    harness.source.hold();

    let mut first = dashboard.leave_balances(Some(me));
    let mut second = dashboard.leave_balances(Some(me));
    first.wait_for(|r| r.is_loading()).await;
    second.wait_for(|r| r.is_loading()).await;
    tokio::task::yield_now().await;

    harness.source.release();
    let (a, b) = tokio::join!(first.settled(), second.settled());

    assert_eq!(a.data, b.data);
    assert_eq!(harness.source.calls(Op::Select), 1);
    assert_eq!(harness.context.client().stats().misses, 1);
}

#[tokio::test]
async fn created_closure_refreshes_observers_of_its_site() {
    let site = SiteId::new();
    let other_site = SiteId::new();
    let harness = Harness::new(InMemorySource::new());
    let dashboard = harness.dashboard(UserType::Staff);

    let mut here = dashboard.closures(Some(site), ClosureRange::all());
    let mut there = dashboard.closures(Some(other_site), ClosureRange::all());
    let before = here.settled().await;
    there.settled().await;
    assert_eq!(before.data, Some(Vec::new()));

    let created = dashboard
        .create_closure(NewClosure::new(
            Some(site),
            "Maintenance",
            ts("2025-05-01"),
            ts("2025-05-02"),
        ))
        .await
        .unwrap();
    assert_eq!(created.created_by, Some(dashboard.session().user_id));

    let after = here.settled_after(before.revision).await;
    assert_eq!(after.data, Some(vec![created]));

    // The other site was not invalidated
    assert_eq!(
        harness.context.client().status(there.key()),
        QueryStatus::Success
    );
    assert_eq!(harness.source.calls(Op::Select), 3);

    let toasts = harness.toasts.toasts();
    assert_eq!(toasts.len(), 1);
    assert!(!toasts[0].is_destructive());
    assert_eq!(toasts[0].description, "Closure created");
}

#[tokio::test]
async fn invalid_closure_never_reaches_the_source() {
    let harness = Harness::new(InMemorySource::new());
    let dashboard = harness.dashboard(UserType::SuperAdmin);

    let err = dashboard
        .create_closure(NewClosure::new(
            Some(SiteId::new()),
            "Backwards",
            ts("2025-01-10"),
            ts("2025-01-05"),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::Validation(_)));
    assert_eq!(harness.source.calls(Op::Insert), 0);
    assert_eq!(harness.toasts.destructive().len(), 1);
}

#[tokio::test]
async fn forbidden_mutation_is_reported_with_a_redirect() {
    let harness = Harness::new(InMemorySource::new());
    let dashboard = harness.dashboard(UserType::Member);

    let err = dashboard
        .create_announcement(NewAnnouncement {
            title: "Hello".to_string(),
            message: "World".to_string(),
            status: AnnouncementStatus::Active,
            user_types: vec![UserType::Member],
            start_date: ts("2025-01-01"),
            end_date: ts("2025-01-31"),
            attachments: Vec::new(),
            created_by: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MutationError::Authorization(AuthorizationError::Forbidden { .. })
    ));
    assert!(err.redirect_to().is_some());
    assert_eq!(harness.source.calls(Op::Insert), 0);
    assert_eq!(harness.toasts.destructive().len(), 1);
}

#[tokio::test]
async fn announcement_created_by_admin_reaches_its_audience() {
    let harness = Harness::new(InMemorySource::new());
    let admin = harness.dashboard(UserType::SuperAdmin);
    let member = harness.dashboard(UserType::Member);

    let mut feed = member.announcements(AnnouncementFilter::active_for(UserType::Member));
    let before = feed.settled().await;
    assert_eq!(before.data, Some(Vec::new()));

    admin
        .create_announcement(NewAnnouncement {
            title: "Open day".to_string(),
            message: "Visit your NADI centre".to_string(),
            status: AnnouncementStatus::Active,
            user_types: vec![UserType::Member, UserType::Staff],
            start_date: ts("2025-06-01"),
            end_date: ts("2025-06-02"),
            attachments: Vec::new(),
            created_by: None,
        })
        .await
        .unwrap();

    let after = feed.settled_after(before.revision).await;
    let titles: Vec<_> = after
        .data
        .unwrap()
        .into_iter()
        .map(|a| a.title)
        .collect();
    assert_eq!(titles, ["Open day"]);
}

#[tokio::test]
async fn leave_submission_refreshes_requests_and_balances() {
    let harness = Harness::new(InMemorySource::new());
    let member = harness.dashboard(UserType::Member);
    let me = member.session().user_id;

    let mut requests = member.leave_requests(Some(me));
    let mut balances = member.leave_balances(Some(me));
    let r0 = requests.settled().await;
    let b0 = balances.settled().await;

    let submitted = member
        .submit_leave_request(NewLeaveRequest {
            user_id: me,
            leave_type_id: LeaveTypeId::new(),
            start_date: date("2025-07-01"),
            end_date: date("2025-07-02"),
            days: 2.0,
            reason: None,
        })
        .await
        .unwrap();

    let r1 = requests.settled_after(r0.revision).await;
    let b1 = balances.settled_after(b0.revision).await;
    assert_eq!(r1.data, Some(vec![submitted.clone()]));
    assert!(b1.revision > b0.revision);

    // Members may not review
    let err = member
        .review_leave_request(submitted.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, MutationError::Authorization(_)));

    let admin = harness.dashboard(UserType::SuperAdmin);
    let approved = admin.review_leave_request(submitted.id, true).await.unwrap();
    assert_eq!(approved.reviewed_by, Some(admin.session().user_id));

    let r2 = requests.settled_after(r1.revision).await;
    assert_eq!(r2.data, Some(vec![approved]));
}

#[tokio::test]
async fn leave_for_someone_else_is_refused() {
    let harness = Harness::new(InMemorySource::new());
    let member = harness.dashboard(UserType::Member);

    let err = member
        .submit_leave_request(NewLeaveRequest {
            user_id: UserId::new(),
            leave_type_id: LeaveTypeId::new(),
            start_date: date("2025-07-01"),
            end_date: date("2025-07-01"),
            days: 1.0,
            reason: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MutationError::Authorization(AuthorizationError::NotOwner { .. })
    ));
    assert_eq!(harness.source.calls(Op::Insert), 0);
}

#[tokio::test]
async fn marking_read_updates_the_unread_feed() {
    let me = UserId::new();
    let first = notification(me, "Leave approved", false);
    let harness = Harness::new(
        InMemorySource::new()
            .with_records(&[first.clone(), notification(me, "Payslip ready", false)])
            .unwrap(),
    );
    let member = Dashboard::new(
        harness.context.clone(),
        Session::new(me, UserType::Member),
    );

    let mut unread = member.notifications(true);
    let v0 = unread.settled().await;
    assert_eq!(v0.data.as_ref().map(Vec::len), Some(2));

    member.mark_notification_read(first.id).await.unwrap();
    let v1 = unread.settled_after(v0.revision).await;
    assert_eq!(v1.data.as_ref().map(Vec::len), Some(1));

    let marked = member.mark_all_notifications_read().await.unwrap();
    assert_eq!(marked.len(), 1);
    let v2 = unread.settled_after(v1.revision).await;
    assert_eq!(v2.data, Some(Vec::new()));
}

#[tokio::test]
async fn refetch_after_recovery_clears_the_error() {
    let site = SiteId::new();
    let harness = Harness::new(InMemorySource::new());
    harness.source.fail(Op::Select, backend_error("timeout"));
    let dashboard = harness.dashboard(UserType::Staff);

    let mut staff = dashboard.staff(Some(site));
    let failed = staff.settled().await;
    assert_eq!(failed.status, QueryStatus::Error);

    harness.source.recover();
    assert!(dashboard.refetch(staff.key()).await);
    let recovered = staff.settled_after(failed.revision).await;

    assert_eq!(recovered.status, QueryStatus::Success);
    assert!(recovered.error.is_none());
    assert_eq!(recovered.data, Some(Vec::new()));
    assert_eq!(harness.toasts.destructive().len(), 1);
}

#[tokio::test]
async fn shutdown_stops_every_observer() {
    let harness = Harness::new(InMemorySource::new());
    let dashboard = harness.dashboard(UserType::Staff);

    let mut inventory = dashboard.inventory(Some(SiteId::new()));
    let mut payroll = dashboard.payroll(Some(dashboard.session().user_id), Some(2025));
    inventory.settled().await;
    payroll.settled().await;

    harness.context.shutdown();

    while !(inventory.is_finished() && payroll.is_finished()) {
        tokio::task::yield_now().await;
    }
}

mock! {
    Toasts {}
    impl Notifier for Toasts {
        fn notify(&self, toast: Toast);
    }
}

#[tokio::test]
async fn failed_write_notifies_once_and_invalidates_nothing() {
    let site = SiteId::new();
    let source = Arc::new(ScriptedSource::empty());
    source.fail(Op::Insert, backend_error("permission denied for table nd_closures"));

    let mut notifier = MockToasts::new();
    notifier
        .expect_notify()
        .withf(|toast| toast.is_destructive() && toast.description.contains("permission denied"))
        .times(1)
        .return_const(());
    let context = AppContext::new(source.clone(), QueryClient::default(), Arc::new(notifier));
    let dashboard = Dashboard::new(context.clone(), Session::new(UserId::new(), UserType::Staff));

    let mut closures = dashboard.closures(Some(site), ClosureRange::all());
    closures.settled().await;

    let err = dashboard
        .create_closure(NewClosure::new(
            Some(site),
            "Audit",
            ts("2025-01-01"),
            ts("2025-01-02"),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::Write(_)));
    assert_eq!(context.client().status(closures.key()), QueryStatus::Success);
    assert_eq!(source.calls(Op::Select), 1);
}
