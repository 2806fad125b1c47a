use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::{
    client::TimeApprovalsApi,
    error::TimeApprovalsError,
    model::{
        EntryFilter, InboxQuery, NewNotice, NewTimeEntry, Notification, PeriodSummary, Principal,
        TickReport, TimeEntry, WeeklyBucket,
    },
};
use crate::domain::service::Services;

/// In-process implementation of `TimeApprovalsApi` that delegates to the domain services
pub struct TimeApprovalsLocalClient {
    services: Services,
}

impl TimeApprovalsLocalClient {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl TimeApprovalsApi for TimeApprovalsLocalClient {
    async fn create_entry(
        &self,
        principal: &Principal,
        new_entry: NewTimeEntry,
    ) -> Result<TimeEntry, TimeApprovalsError> {
        self.services
            .approvals
            .create_entry(principal, new_entry)
            .await
            .map_err(Into::into)
    }

    async fn get_entry(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<TimeEntry, TimeApprovalsError> {
        self.services
            .approvals
            .get_entry(principal, id)
            .await
            .map_err(Into::into)
    }

    async fn list_entries(
        &self,
        principal: &Principal,
        filter: EntryFilter,
    ) -> Result<Vec<TimeEntry>, TimeApprovalsError> {
        self.services
            .approvals
            .list_entries(principal, filter)
            .await
            .map_err(Into::into)
    }

    async fn list_pending(
        &self,
        principal: &Principal,
    ) -> Result<Vec<TimeEntry>, TimeApprovalsError> {
        self.services
            .approvals
            .list_pending(principal)
            .await
            .map_err(Into::into)
    }

    async fn approve(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<TimeEntry, TimeApprovalsError> {
        self.services
            .approvals
            .approve(principal, id)
            .await
            .map_err(Into::into)
    }

    async fn reject(
        &self,
        principal: &Principal,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<TimeEntry, TimeApprovalsError> {
        self.services
            .approvals
            .reject(principal, id, reason)
            .await
            .map_err(Into::into)
    }

    async fn weekly_summary(
        &self,
        principal: &Principal,
        today: NaiveDate,
    ) -> Result<WeeklyBucket, TimeApprovalsError> {
        self.services
            .approvals
            .weekly_summary(principal, today)
            .await
            .map_err(Into::into)
    }

    async fn period_summary(
        &self,
        principal: &Principal,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PeriodSummary, TimeApprovalsError> {
        self.services
            .approvals
            .period_summary(principal, from, to)
            .await
            .map_err(Into::into)
    }

    async fn list_notifications(
        &self,
        principal: &Principal,
        query: InboxQuery,
    ) -> Result<Vec<Notification>, TimeApprovalsError> {
        self.services
            .inbox
            .list(principal, query)
            .await
            .map_err(Into::into)
    }

    async fn unread_count(&self, principal: &Principal) -> Result<u64, TimeApprovalsError> {
        self.services
            .inbox
            .unread_count(principal)
            .await
            .map_err(Into::into)
    }

    async fn mark_read(&self, principal: &Principal, id: Uuid) -> Result<(), TimeApprovalsError> {
        self.services
            .inbox
            .mark_read(principal, id)
            .await
            .map_err(Into::into)
    }

    async fn mark_all_read(&self, principal: &Principal) -> Result<u64, TimeApprovalsError> {
        self.services
            .inbox
            .mark_all_read(principal)
            .await
            .map_err(Into::into)
    }

    async fn delete_notification(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<(), TimeApprovalsError> {
        self.services
            .inbox
            .delete(principal, id)
            .await
            .map_err(Into::into)
    }

    async fn send_notice(
        &self,
        principal: &Principal,
        notice: NewNotice,
    ) -> Result<Notification, TimeApprovalsError> {
        self.services
            .inbox
            .send_notice(principal, notice)
            .await
            .map_err(Into::into)
    }

    async fn reconcile_now(&self, principal: &Principal) -> Result<TickReport, TimeApprovalsError> {
        self.services
            .reconciler
            .run_now(principal)
            .await
            .map_err(Into::into)
    }
}
