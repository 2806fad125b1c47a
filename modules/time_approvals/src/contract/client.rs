use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::{
    error::TimeApprovalsError,
    model::{
        EntryFilter, InboxQuery, NewNotice, NewTimeEntry, Notification, PeriodSummary, Principal,
        TickReport, TimeEntry, WeeklyBucket,
    },
};

/// Public API trait for the time_approvals module that other modules can use.
/// Every call is made on behalf of a `Principal`; the module only authorizes.
#[async_trait]
pub trait TimeApprovalsApi: Send + Sync {
    /// Record a new entry for the caller in `Pending` state
    async fn create_entry(
        &self,
        principal: &Principal,
        new_entry: NewTimeEntry,
    ) -> Result<TimeEntry, TimeApprovalsError>;

    async fn get_entry(&self, principal: &Principal, id: Uuid)
        -> Result<TimeEntry, TimeApprovalsError>;

    async fn list_entries(
        &self,
        principal: &Principal,
        filter: EntryFilter,
    ) -> Result<Vec<TimeEntry>, TimeApprovalsError>;

    /// Entries awaiting a decision in the caller's tenant (admin only)
    async fn list_pending(&self, principal: &Principal)
        -> Result<Vec<TimeEntry>, TimeApprovalsError>;

    async fn approve(&self, principal: &Principal, id: Uuid)
        -> Result<TimeEntry, TimeApprovalsError>;

    async fn reject(
        &self,
        principal: &Principal,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<TimeEntry, TimeApprovalsError>;

    /// Monday-based week containing `today`
    async fn weekly_summary(
        &self,
        principal: &Principal,
        today: NaiveDate,
    ) -> Result<WeeklyBucket, TimeApprovalsError>;

    async fn period_summary(
        &self,
        principal: &Principal,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PeriodSummary, TimeApprovalsError>;

    /// Inbox of the caller, newest first
    async fn list_notifications(
        &self,
        principal: &Principal,
        query: InboxQuery,
    ) -> Result<Vec<Notification>, TimeApprovalsError>;

    async fn unread_count(&self, principal: &Principal) -> Result<u64, TimeApprovalsError>;

    async fn mark_read(&self, principal: &Principal, id: Uuid) -> Result<(), TimeApprovalsError>;

    async fn mark_all_read(&self, principal: &Principal) -> Result<u64, TimeApprovalsError>;

    async fn delete_notification(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<(), TimeApprovalsError>;

    /// Send a reminder/report/system notice to a tenant member (admin only)
    async fn send_notice(
        &self,
        principal: &Principal,
        notice: NewNotice,
    ) -> Result<Notification, TimeApprovalsError>;

    /// Run one reconciliation tick for the caller's tenant (admin only)
    async fn reconcile_now(&self, principal: &Principal) -> Result<TickReport, TimeApprovalsError>;
}
