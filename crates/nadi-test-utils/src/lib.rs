//! Testing utilities for the NADI admin workspace
//!
//! Shared data sources, notifiers and fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::NaiveDate;
use nadi_model::{
    Announcement, AnnouncementId, AnnouncementStatus, ClosureId, ClosureRecord, InventoryItem,
    InventoryItemId, LeaveBalance, LeaveBalanceId, LeaveTypeId, Notification, NotificationId,
    PayrollId, PayrollRecord, PayrollStatus, SiteId, StaffId, StaffMember, StaffStatus, Timestamp,
    UserId, UserType,
};
use nadi_query::{Notifier, Toast};
use nadi_source::{DataSource, Filter, InMemorySource, RemoteError, Row, Select};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Data source operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
}

/// In-memory source that counts calls, can be held, and can be told to fail
///
/// Calls are counted on entry, before any hold, so a test can assert how
/// many remote calls were issued while they are still pending.
#[derive(Debug)]
pub struct ScriptedSource {
    inner: InMemorySource,
    calls: [AtomicUsize; 4],
    failures: Mutex<HashMap<Op, RemoteError>>,
    open: watch::Sender<bool>,
}

impl ScriptedSource {
    pub fn new(inner: InMemorySource) -> Self {
        Self {
            inner,
            calls: Default::default(),
            failures: Mutex::new(HashMap::new()),
            open: watch::channel(true).0,
        }
    }

    pub fn empty() -> Self {
        Self::new(InMemorySource::new())
    }

    pub fn inner(&self) -> &InMemorySource {
        &self.inner
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls[op as usize].load(Ordering::SeqCst)
    }

    /// Make every later `op` fail with `error`
    pub fn fail(&self, op: Op, error: RemoteError) {
        self.failures.lock().insert(op, error);
    }

    /// Stop failing
    pub fn recover(&self) {
        self.failures.lock().clear();
    }

    /// Block calls until [`ScriptedSource::release`]
    pub fn hold(&self) {
        self.open.send_replace(false);
    }

    pub fn release(&self) {
        self.open.send_replace(true);
    }

    async fn enter(&self, op: Op) -> Result<(), RemoteError> {
        self.calls[op as usize].fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.subscribe();
        // The sender lives in self, so this cannot observe a closed channel
        let _ = open.wait_for(|open| *open).await;
        match self.failures.lock().get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn select(&self, query: Select) -> Result<Vec<Row>, RemoteError> {
        self.enter(Op::Select).await?;
        self.inner.select(query).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, RemoteError> {
        self.enter(Op::Insert).await?;
        self.inner.insert(table, row).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, RemoteError> {
        self.enter(Op::Update).await?;
        self.inner.update(table, filters, patch).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, RemoteError> {
        self.enter(Op::Delete).await?;
        self.inner.delete(table, filters).await
    }
}

/// Notifier that keeps every toast
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    pub fn destructive(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .iter()
            .filter(|t| t.is_destructive())
            .cloned()
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}

/// A backend error like PostgREST returns for a missing relation
pub fn backend_error(message: &str) -> RemoteError {
    RemoteError::Backend {
        status: 404,
        code: Some("42P01".to_string()),
        message: message.to_string(),
        details: None,
        hint: None,
    }
}

pub fn ts(raw: &str) -> Timestamp {
    raw.parse().unwrap()
}

pub fn date(raw: &str) -> NaiveDate {
    raw.parse().unwrap()
}

pub fn leave_balance(
    user: UserId,
    leave_type: &str,
    total: f64,
    used: f64,
    pending: f64,
) -> LeaveBalance {
    LeaveBalance {
        id: LeaveBalanceId::new(),
        user_id: user,
        leave_type_id: LeaveTypeId::new(),
        leave_type: leave_type.to_string(),
        total_days: total,
        used_days: used,
        pending_days: pending,
        remaining_days: total - used - pending,
    }
}

pub fn closure(site: SiteId, title: &str, start: &str, end: &str) -> ClosureRecord {
    ClosureRecord {
        id: ClosureId::new(),
        site_id: site,
        title: title.to_string(),
        start_date: ts(start),
        end_date: ts(end),
        is_recurring: false,
        recurrence_pattern: None,
        description: None,
        created_by: None,
    }
}

pub fn announcement(title: &str, audience: &[UserType], start: &str, end: &str) -> Announcement {
    Announcement {
        id: AnnouncementId::new(),
        title: title.to_string(),
        message: format!("{title} details"),
        status: AnnouncementStatus::Active,
        user_types: audience.to_vec(),
        start_date: ts(start),
        end_date: ts(end),
        attachments: Vec::new(),
        created_by: None,
        created_at: Some(ts(start)),
    }
}

pub fn staff_member(site: SiteId, name: &str) -> StaffMember {
    StaffMember {
        id: StaffId::new(),
        site_id: site,
        name: name.to_string(),
        email: format!("{}@nadi.my", name.to_lowercase().replace(' ', ".")),
        phone: None,
        employment_date: date("2024-01-15"),
        status: StaffStatus::Active,
        role: "Assistant Manager".to_string(),
    }
}

pub fn notification(user: UserId, title: &str, read: bool) -> Notification {
    Notification {
        id: NotificationId::new(),
        user_id: user,
        title: title.to_string(),
        message: format!("{title} details"),
        category: None,
        read_at: read.then(|| ts("2025-01-02T08:00:00Z")),
        created_at: Some(ts("2025-01-01T08:00:00Z")),
    }
}

pub fn inventory_item(site: SiteId, name: &str, quantity: u32) -> InventoryItem {
    InventoryItem {
        id: InventoryItemId::new(),
        site_id: site,
        name: name.to_string(),
        category: Some("hardware".to_string()),
        quantity,
        unit: Some("unit".to_string()),
        updated_at: None,
    }
}

pub fn payroll(user: UserId, year: i32, month: u32) -> PayrollRecord {
    PayrollRecord {
        id: PayrollId::new(),
        user_id: user,
        year,
        month,
        gross_pay: 3_000.0,
        deductions: 450.0,
        net_pay: 2_550.0,
        status: PayrollStatus::Paid,
    }
}
