use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{
    DailySummary, EntryFilter, EntryStatus, NewTimeEntry, NotificationPayload, PeriodSummary,
    Principal, ShiftLeg, TimeEntry, WeeklyBucket,
};
use crate::domain::accounting;
use crate::domain::error::DomainError;
use crate::domain::events::NotificationEvent;
use crate::domain::ports::EventPublisher;
use crate::domain::repo::{InsertOutcome, TimeEntryRepository};
use crate::domain::service::{require_admin, ServiceConfig};
use crate::domain::templates;

/// Administrator decision on a time entry.
#[derive(Debug, Clone)]
pub enum Decision {
    Approve,
    Reject { reason: Option<String> },
}

impl Decision {
    pub fn target(&self) -> EntryStatus {
        match self {
            Decision::Approve => EntryStatus::Approved,
            Decision::Reject { .. } => EntryStatus::Rejected,
        }
    }

    fn payload(&self, entry: &TimeEntry, decided_by: Uuid) -> NotificationPayload {
        match self {
            Decision::Approve => NotificationPayload::Approved {
                entry_id: entry.id,
                entry_date: entry.date,
                decided_by,
            },
            Decision::Reject { reason } => NotificationPayload::Rejected {
                entry_id: entry.id,
                entry_date: entry.date,
                decided_by,
                reason: reason.clone(),
            },
        }
    }
}

/// The only writer of entry status.
///
/// Entries start `Pending`; an admin of the entry's tenant moves them to
/// `Approved` or `Rejected` and may flip between the two. Each transition
/// notifies the owner exactly once.
#[derive(Clone)]
pub struct ApprovalService {
    entries: Arc<dyn TimeEntryRepository>,
    events: Arc<dyn EventPublisher<NotificationEvent>>,
    config: ServiceConfig,
}

impl ApprovalService {
    pub fn new(
        entries: Arc<dyn TimeEntryRepository>,
        events: Arc<dyn EventPublisher<NotificationEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            entries,
            events,
            config,
        }
    }

    #[instrument(
        name = "time_approvals.service.create_entry",
        skip(self, principal, new_entry),
        fields(owner_id = %principal.user_id, tenant_id = %principal.tenant_id, date = %new_entry.date)
    )]
    pub async fn create_entry(
        &self,
        principal: &Principal,
        new_entry: NewTimeEntry,
    ) -> Result<TimeEntry, DomainError> {
        info!("Creating time entry");

        self.validate_new_entry(&new_entry)?;

        let scope = principal.scope();
        // Early rejection; the unique index below is what actually guarantees it
        if self
            .entries
            .find_by_owner_and_date(&scope, principal.user_id, new_entry.date)
            .await?
            .is_some()
        {
            return Err(DomainError::duplicate_entry(
                principal.user_id,
                new_entry.date,
            ));
        }

        let now = Utc::now();
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            owner_id: principal.user_id,
            tenant_id: principal.tenant_id,
            date: new_entry.date,
            shift1: new_entry.shift1,
            shift2: new_entry.shift2,
            observation: new_entry
                .observation
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty()),
            status: EntryStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        match self.entries.insert(&scope, entry.clone()).await? {
            InsertOutcome::Inserted => {}
            InsertOutcome::Duplicate => {
                return Err(DomainError::duplicate_entry(entry.owner_id, entry.date));
            }
        }

        info!(entry_id = %entry.id, "Successfully created time entry");
        Ok(entry)
    }

    #[instrument(
        name = "time_approvals.service.get_entry",
        skip(self, principal),
        fields(entry_id = %id, user_id = %principal.user_id)
    )]
    pub async fn get_entry(&self, principal: &Principal, id: Uuid) -> Result<TimeEntry, DomainError> {
        debug!("Getting time entry by id");

        let entry = self
            .entries
            .find(&principal.scope(), id)
            .await?
            .ok_or_else(|| DomainError::entry_not_found(id))?;

        // Employees cannot tell someone else's entry from a missing one
        if !principal.is_admin() && entry.owner_id != principal.user_id {
            return Err(DomainError::entry_not_found(id));
        }
        Ok(entry)
    }

    #[instrument(
        name = "time_approvals.service.list_entries",
        skip(self, principal, filter),
        fields(user_id = %principal.user_id)
    )]
    pub async fn list_entries(
        &self,
        principal: &Principal,
        mut filter: EntryFilter,
    ) -> Result<Vec<TimeEntry>, DomainError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if to < from {
                return Err(DomainError::validation("to", "must not be before 'from'"));
            }
        }

        if !principal.is_admin() {
            match filter.owner_id {
                Some(owner) if owner != principal.user_id => {
                    return Err(DomainError::forbidden(
                        "employees can only list their own entries",
                    ));
                }
                _ => filter.owner_id = Some(principal.user_id),
            }
        }

        let entries = self.entries.list(&principal.scope(), &filter).await?;
        debug!("Listed {} time entries", entries.len());
        Ok(entries)
    }

    #[instrument(
        name = "time_approvals.service.list_pending",
        skip(self, principal),
        fields(tenant_id = %principal.tenant_id)
    )]
    pub async fn list_pending(&self, principal: &Principal) -> Result<Vec<TimeEntry>, DomainError> {
        require_admin(principal, "list pending entries")?;
        let entries = self
            .entries
            .list_by_status(&principal.scope(), EntryStatus::Pending)
            .await?;
        Ok(entries)
    }

    pub async fn approve(&self, principal: &Principal, id: Uuid) -> Result<TimeEntry, DomainError> {
        self.decide(principal, id, Decision::Approve).await
    }

    pub async fn reject(
        &self,
        principal: &Principal,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<TimeEntry, DomainError> {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if let Some(r) = &reason {
            if r.chars().count() > self.config.max_note_length {
                return Err(DomainError::validation(
                    "reason",
                    format!("must be at most {} characters", self.config.max_note_length),
                ));
            }
        }
        self.decide(principal, id, Decision::Reject { reason }).await
    }

    #[instrument(
        name = "time_approvals.service.decide",
        skip(self, principal, decision),
        fields(entry_id = %id, admin_id = %principal.user_id, to = %decision.target())
    )]
    pub async fn decide(
        &self,
        principal: &Principal,
        id: Uuid,
        decision: Decision,
    ) -> Result<TimeEntry, DomainError> {
        info!("Deciding time entry");

        require_admin(principal, "approve or reject time entries")?;

        let scope = principal.scope();
        let entry = self
            .entries
            .find(&scope, id)
            .await?
            .ok_or_else(|| DomainError::entry_not_found(id))?;

        let to = decision.target();
        if entry.status == to {
            return Err(DomainError::invalid_transition(entry.status, to));
        }

        let now = Utc::now();
        let notification = templates::compose(
            entry.owner_id,
            entry.tenant_id,
            decision.payload(&entry, principal.user_id),
            self.config.locale,
            now,
        );
        if !self
            .entries
            .record_decision(&scope, id, entry.status, to, now, notification.clone())
            .await?
        {
            return Err(DomainError::concurrent_modification(id));
        }
        self.events
            .publish(&NotificationEvent::Inserted(notification));

        info!(from = %entry.status, "Successfully decided time entry");
        Ok(TimeEntry {
            status: to,
            updated_at: now,
            ..entry
        })
    }

    /// Caller's Monday-based week containing `today`
    #[instrument(
        name = "time_approvals.service.weekly_summary",
        skip(self, principal),
        fields(user_id = %principal.user_id, today = %today)
    )]
    pub async fn weekly_summary(
        &self,
        principal: &Principal,
        today: NaiveDate,
    ) -> Result<WeeklyBucket, DomainError> {
        let start = accounting::week_start(today);
        let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
        let entries = self.own_entries(principal, start, end).await?;
        Ok(accounting::weekly_bucket(&entries, today))
    }

    #[instrument(
        name = "time_approvals.service.period_summary",
        skip(self, principal),
        fields(user_id = %principal.user_id, from = %from, to = %to)
    )]
    pub async fn period_summary(
        &self,
        principal: &Principal,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PeriodSummary, DomainError> {
        if to < from {
            return Err(DomainError::validation("to", "must not be before 'from'"));
        }
        if (to - from).num_days() >= self.config.max_period_days {
            return Err(DomainError::validation(
                "to",
                format!("range must be shorter than {} days", self.config.max_period_days),
            ));
        }
        let entries = self.own_entries(principal, from, to).await?;
        Ok(accounting::period_summary(
            &entries,
            from,
            to,
            self.config.standard_daily_minutes,
            self.config.expected_daily_minutes,
        ))
    }

    /// Worked/normal/overtime split of one entry under the configured workload
    pub fn daily_summary(&self, entry: &TimeEntry) -> DailySummary {
        accounting::daily_summary(entry, self.config.standard_daily_minutes)
    }

    async fn own_entries(
        &self,
        principal: &Principal,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeEntry>, DomainError> {
        let filter = EntryFilter {
            owner_id: Some(principal.user_id),
            from: Some(from),
            to: Some(to),
        };
        Ok(self.entries.list(&principal.scope(), &filter).await?)
    }

    fn validate_new_entry(&self, new_entry: &NewTimeEntry) -> Result<(), DomainError> {
        if new_entry.shift1.entry.is_none() {
            return Err(DomainError::validation("shift1.entry", "is required"));
        }
        validate_leg("shift1", &new_entry.shift1)?;
        validate_leg("shift2", &new_entry.shift2)?;

        if let Some(observation) = &new_entry.observation {
            if observation.chars().count() > self.config.max_observation_length {
                return Err(DomainError::validation(
                    "observation",
                    format!(
                        "must be at most {} characters",
                        self.config.max_observation_length
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn validate_leg(name: &str, leg: &ShiftLeg) -> Result<(), DomainError> {
    if leg.exit.is_some() && leg.entry.is_none() {
        return Err(DomainError::validation(
            format!("{}.exit", name),
            format!("requires {}.entry", name),
        ));
    }
    Ok(())
}
