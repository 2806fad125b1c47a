use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Approval state of a time entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Pending,
    Approved,
    Rejected,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Approved => "approved",
            EntryStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(EntryStatus::Pending),
            "approved" => Some(EntryStatus::Approved),
            "rejected" => Some(EntryStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One shift leg. `exit` is only meaningful together with `entry`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftLeg {
    pub entry: Option<NaiveTime>,
    pub exit: Option<NaiveTime>,
}

impl ShiftLeg {
    pub fn new(entry: Option<NaiveTime>, exit: Option<NaiveTime>) -> Self {
        Self { entry, exit }
    }

    pub fn closed(entry: NaiveTime, exit: NaiveTime) -> Self {
        Self {
            entry: Some(entry),
            exit: Some(exit),
        }
    }
}

/// One employee's reported shifts for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub shift1: ShiftLeg,
    pub shift2: ShiftLeg,
    pub observation: Option<String>,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new entry; the owner is the calling principal.
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub date: NaiveDate,
    pub shift1: ShiftLeg,
    pub shift2: ShiftLeg,
    pub observation: Option<String>,
}

/// Entry listing filter. `owner_id = None` means "the caller" for employees
/// and "anyone in the tenant" for admins.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub owner_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    PendingApproval,
    Approved,
    Rejected,
    Reminder,
    Report,
    System,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::PendingApproval => "pending_approval",
            NotificationKind::Approved => "approved",
            NotificationKind::Rejected => "rejected",
            NotificationKind::Reminder => "reminder",
            NotificationKind::Report => "report",
            NotificationKind::System => "system",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending_approval" => Some(NotificationKind::PendingApproval),
            "approved" => Some(NotificationKind::Approved),
            "rejected" => Some(NotificationKind::Rejected),
            "reminder" => Some(NotificationKind::Reminder),
            "report" => Some(NotificationKind::Report),
            "system" => Some(NotificationKind::System),
            _ => None,
        }
    }

    /// Kinds an administrator may send by hand.
    pub fn is_notice(self) -> bool {
        matches!(
            self,
            NotificationKind::Reminder | NotificationKind::Report | NotificationKind::System
        )
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific notification payload.
///
/// Persisted as JSON in the `metadata` column, so unlike the rest of the
/// contract it carries serde derives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    PendingApproval {
        entry_id: Uuid,
        owner_id: Uuid,
        owner_name: String,
        entry_date: NaiveDate,
    },
    Approved {
        entry_id: Uuid,
        entry_date: NaiveDate,
        decided_by: Uuid,
    },
    Rejected {
        entry_id: Uuid,
        entry_date: NaiveDate,
        decided_by: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Reminder {
        note: String,
    },
    Report {
        note: String,
    },
    System {
        note: String,
    },
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::PendingApproval { .. } => NotificationKind::PendingApproval,
            NotificationPayload::Approved { .. } => NotificationKind::Approved,
            NotificationPayload::Rejected { .. } => NotificationKind::Rejected,
            NotificationPayload::Reminder { .. } => NotificationKind::Reminder,
            NotificationPayload::Report { .. } => NotificationKind::Report,
            NotificationPayload::System { .. } => NotificationKind::System,
        }
    }

    pub fn related_entry_id(&self) -> Option<Uuid> {
        match self {
            NotificationPayload::PendingApproval { entry_id, .. }
            | NotificationPayload::Approved { entry_id, .. }
            | NotificationPayload::Rejected { entry_id, .. } => Some(*entry_id),
            NotificationPayload::Reminder { .. }
            | NotificationPayload::Report { .. }
            | NotificationPayload::System { .. } => None,
        }
    }

    /// Build a hand-sent notice payload; `None` for workflow kinds.
    pub fn notice(kind: NotificationKind, note: String) -> Option<Self> {
        match kind {
            NotificationKind::Reminder => Some(NotificationPayload::Reminder { note }),
            NotificationKind::Report => Some(NotificationPayload::Report { note }),
            NotificationKind::System => Some(NotificationPayload::System { note }),
            _ => None,
        }
    }
}

/// Inbox item. `kind` and `related_entry_id` are read from the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub message: String,
    pub payload: NotificationPayload,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }

    pub fn related_entry_id(&self) -> Option<Uuid> {
        self.payload.related_entry_id()
    }
}

/// A notice sent by an administrator to one tenant member.
#[derive(Debug, Clone)]
pub struct NewNotice {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub note: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InboxQuery {
    pub unread_only: bool,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Employee,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "employee" => Some(Role::Employee),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Tenant boundary every repository call is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantScope {
    tenant_id: Uuid,
}

impl TenantScope {
    pub fn new(tenant_id: Uuid) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

/// Calling identity as handed over by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, tenant_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            tenant_id,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn scope(&self) -> TenantScope {
        TenantScope::new(self.tenant_id)
    }
}

/// Directory record of a tenant member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub display_name: String,
    pub role: Role,
}

/// Minute count rendered with an explicit sign (`+HH:MM` / `-HH:MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SignedMinutes(pub i64);

impl fmt::Display for SignedMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailySummary {
    pub worked: i64,
    pub normal: i64,
    pub overtime: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub worked: i64,
    pub normal: i64,
    pub overtime: i64,
    pub working_days: i64,
    pub expected: i64,
    pub balance: SignedMinutes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub minutes: i64,
    /// Status of the entry recorded that day, if any. Rejected days count zero.
    pub status: Option<EntryStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyBucket {
    pub week_start: NaiveDate,
    pub days: Vec<WeekDay>,
    pub total: i64,
}

/// Reconciliation pass identifiers, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Discover,
    CreateMissing,
    CloseStale,
    Retain,
}

impl Pass {
    pub fn as_str(self) -> &'static str {
        match self {
            Pass::Discover => "discover",
            Pass::CreateMissing => "create_missing",
            Pass::CloseStale => "close_stale",
            Pass::Retain => "retain",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one reconciliation tick for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tenant_id: Uuid,
    pub discovered: usize,
    pub created: u64,
    pub closed: u64,
    pub pruned: u64,
    pub failed: Vec<Pass>,
}

impl TickReport {
    pub fn new(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            discovered: 0,
            created: 0,
            closed: 0,
            pruned: 0,
            failed: Vec::new(),
        }
    }

    pub fn changed_anything(&self) -> bool {
        self.created > 0 || self.closed > 0 || self.pruned > 0
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
