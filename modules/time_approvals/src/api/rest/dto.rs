use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::contract::model::{
    DailySummary, EntryFilter, InboxQuery, NewNotice, NewTimeEntry, Notification,
    NotificationKind, PeriodSummary, ShiftLeg, TickReport, TimeEntry, WeekDay, WeeklyBucket,
};
use crate::domain::accounting::format_minutes;
use crate::domain::error::DomainError;

/// One shift leg; times accept `HH:MM` or `HH:MM:SS`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct ShiftDto {
    #[schema(value_type = Option<String>, example = "08:00:00")]
    pub entry: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "12:00:00")]
    pub exit: Option<NaiveTime>,
}

impl From<ShiftLeg> for ShiftDto {
    fn from(leg: ShiftLeg) -> Self {
        Self {
            entry: leg.entry,
            exit: leg.exit,
        }
    }
}

impl From<ShiftDto> for ShiftLeg {
    fn from(dto: ShiftDto) -> Self {
        ShiftLeg::new(dto.entry, dto.exit)
    }
}

/// REST DTO for recording a time entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateEntryReq {
    pub date: NaiveDate,
    pub shift1: ShiftDto,
    #[serde(default)]
    pub shift2: ShiftDto,
    #[serde(default)]
    pub observation: Option<String>,
}

impl From<CreateEntryReq> for NewTimeEntry {
    fn from(req: CreateEntryReq) -> Self {
        Self {
            date: req.date,
            shift1: req.shift1.into(),
            shift2: req.shift2.into(),
            observation: req.observation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailySummaryDto {
    pub worked_minutes: i64,
    pub normal_minutes: i64,
    pub overtime_minutes: i64,
    /// `HH:MM`
    pub worked: String,
}

impl From<DailySummary> for DailySummaryDto {
    fn from(s: DailySummary) -> Self {
        Self {
            worked_minutes: s.worked,
            normal_minutes: s.normal,
            overtime_minutes: s.overtime,
            worked: format_minutes(s.worked),
        }
    }
}

/// REST DTO for time entry representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeEntryDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub shift1: ShiftDto,
    pub shift2: ShiftDto,
    pub observation: Option<String>,
    /// `pending` | `approved` | `rejected`
    pub status: String,
    pub summary: DailySummaryDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntryDto {
    pub fn new(entry: TimeEntry, summary: DailySummary) -> Self {
        Self {
            id: entry.id,
            owner_id: entry.owner_id,
            tenant_id: entry.tenant_id,
            date: entry.date,
            shift1: entry.shift1.into(),
            shift2: entry.shift2.into(),
            observation: entry.observation,
            status: entry.status.as_str().to_string(),
            summary: summary.into(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeEntryListDto {
    pub items: Vec<TimeEntryDto>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEntriesQuery {
    /// Owner to list; employees may only pass their own id
    pub owner_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl From<ListEntriesQuery> for EntryFilter {
    fn from(q: ListEntriesQuery) -> Self {
        Self {
            owner_id: q.owner_id,
            from: q.from,
            to: q.to,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RejectReq {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeekQuery {
    /// Any day of the week to summarize; defaults to today (UTC)
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeekDayDto {
    pub date: NaiveDate,
    pub minutes: i64,
    pub worked: String,
    pub status: Option<String>,
}

impl From<WeekDay> for WeekDayDto {
    fn from(d: WeekDay) -> Self {
        Self {
            date: d.date,
            minutes: d.minutes,
            worked: format_minutes(d.minutes),
            status: d.status.map(|s| s.as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeeklyBucketDto {
    pub week_start: NaiveDate,
    pub days: Vec<WeekDayDto>,
    pub total_minutes: i64,
    pub total: String,
}

impl From<WeeklyBucket> for WeeklyBucketDto {
    fn from(w: WeeklyBucket) -> Self {
        Self {
            week_start: w.week_start,
            days: w.days.into_iter().map(WeekDayDto::from).collect(),
            total_minutes: w.total,
            total: format_minutes(w.total),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PeriodSummaryDto {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub worked_minutes: i64,
    pub normal_minutes: i64,
    pub overtime_minutes: i64,
    pub working_days: i64,
    pub expected_minutes: i64,
    pub balance_minutes: i64,
    /// `+HH:MM` / `-HH:MM`
    pub balance: String,
}

impl From<PeriodSummary> for PeriodSummaryDto {
    fn from(s: PeriodSummary) -> Self {
        Self {
            from: s.from,
            to: s.to,
            worked_minutes: s.worked,
            normal_minutes: s.normal,
            overtime_minutes: s.overtime,
            working_days: s.working_days,
            expected_minutes: s.expected,
            balance_minutes: s.balance.0,
            balance: s.balance.to_string(),
        }
    }
}

/// REST DTO for an inbox item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationDto {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub tenant_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_entry_id: Option<Uuid>,
    /// Kind-specific payload, tagged by `kind`
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        let metadata = serde_json::to_value(&n.payload).unwrap_or(serde_json::Value::Null);
        Self {
            id: n.id,
            recipient_id: n.recipient_id,
            tenant_id: n.tenant_id,
            kind: n.kind().as_str().to_string(),
            related_entry_id: n.related_entry_id(),
            title: n.title,
            message: n.message,
            metadata,
            read: n.read,
            read_at: n.read_at,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationListDto {
    pub items: Vec<NotificationDto>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InboxParams {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u32>,
}

impl From<InboxParams> for InboxQuery {
    fn from(p: InboxParams) -> Self {
        Self {
            unread_only: p.unread_only,
            limit: p.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountDto {
    pub unread: u64,
}

/// Sent on the event stream when pushes were dropped; clients re-fetch the inbox
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct ResyncDto {
    pub missed: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadDto {
    pub updated: u64,
}

/// REST DTO for sending a notice
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendNoticeReq {
    pub recipient_id: Uuid,
    /// `reminder` | `report` | `system`
    pub kind: String,
    pub note: String,
}

impl TryFrom<SendNoticeReq> for NewNotice {
    type Error = DomainError;

    fn try_from(req: SendNoticeReq) -> Result<Self, Self::Error> {
        let kind = NotificationKind::parse(req.kind.trim())
            .filter(|k| k.is_notice())
            .ok_or_else(|| {
                DomainError::validation("kind", "must be one of: reminder, report, system")
            })?;
        Ok(Self {
            recipient_id: req.recipient_id,
            kind,
            note: req.note,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TickReportDto {
    pub tenant_id: Uuid,
    pub discovered: usize,
    pub created: u64,
    pub closed: u64,
    pub pruned: u64,
    /// Passes that failed and will be retried next tick
    pub failed: Vec<String>,
}

impl From<TickReport> for TickReportDto {
    fn from(r: TickReport) -> Self {
        Self {
            tenant_id: r.tenant_id,
            discovered: r.discovered,
            created: r.created,
            closed: r.closed,
            pruned: r.pruned,
            failed: r.failed.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }
}
