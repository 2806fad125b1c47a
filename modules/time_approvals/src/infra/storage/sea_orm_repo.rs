//! SeaORM-backed implementations of the domain ports.
//!
//! Each repository is generic over `C: ConnectionTrait`, so it can be built
//! from a `DatabaseConnection` or from a transaction. Entry decisions open
//! their own transaction and so also need `TransactionTrait`. Every statement starts
//! from the tenant-scoped builders in [`super::scope`].

use std::collections::{HashMap, HashSet};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::contract::model::{
    EntryFilter, EntryStatus, Member, Notification, Role, TenantScope, TimeEntry,
};
use crate::domain::ports::DirectoryPort;
use crate::domain::repo::{InsertOutcome, NotificationRepository, TimeEntryRepository};
use crate::infra::storage::entity::{notification, tenant_member, time_entry};
use crate::infra::storage::mapper::{
    entry_to_active, member_to_active, notification_to_active, pending_approval_kind,
};
use crate::infra::storage::scope::{delete_in, find_in, update_in};

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn entries_from(rows: Vec<time_entry::Model>) -> anyhow::Result<Vec<TimeEntry>> {
    rows.into_iter().map(TimeEntry::try_from).collect()
}

fn notifications_from(rows: Vec<notification::Model>) -> anyhow::Result<Vec<Notification>> {
    rows.into_iter().map(Notification::try_from).collect()
}

/// SeaORM repository for time entries.
pub struct SeaOrmTimeEntryRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmTimeEntryRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> TimeEntryRepository for SeaOrmTimeEntryRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find(&self, scope: &TenantScope, id: Uuid) -> anyhow::Result<Option<TimeEntry>> {
        let found = find_in::<time_entry::Entity>(scope)
            .filter(time_entry::Column::Id.eq(id))
            .one(&self.conn)
            .await
            .context("find time entry failed")?;
        found.map(TimeEntry::try_from).transpose()
    }

    async fn find_by_owner_and_date(
        &self,
        scope: &TenantScope,
        owner_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<Option<TimeEntry>> {
        let found = find_in::<time_entry::Entity>(scope)
            .filter(time_entry::Column::OwnerId.eq(owner_id))
            .filter(time_entry::Column::Date.eq(date))
            .one(&self.conn)
            .await
            .context("find_by_owner_and_date failed")?;
        found.map(TimeEntry::try_from).transpose()
    }

    async fn insert(&self, scope: &TenantScope, entry: TimeEntry) -> anyhow::Result<InsertOutcome> {
        anyhow::ensure!(
            entry.tenant_id == scope.tenant_id(),
            "time entry {} does not belong to tenant {}",
            entry.id,
            scope.tenant_id()
        );
        match time_entry::Entity::insert(entry_to_active(entry))
            .exec_without_returning(&self.conn)
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e).context("insert time entry failed"),
        }
    }

    async fn list(
        &self,
        scope: &TenantScope,
        filter: &EntryFilter,
    ) -> anyhow::Result<Vec<TimeEntry>> {
        let mut query = find_in::<time_entry::Entity>(scope);
        if let Some(owner_id) = filter.owner_id {
            query = query.filter(time_entry::Column::OwnerId.eq(owner_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(time_entry::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(time_entry::Column::Date.lte(to));
        }
        let rows = query
            .order_by_asc(time_entry::Column::Date)
            .order_by_asc(time_entry::Column::OwnerId)
            .all(&self.conn)
            .await
            .context("list time entries failed")?;
        entries_from(rows)
    }

    async fn list_by_status(
        &self,
        scope: &TenantScope,
        status: EntryStatus,
    ) -> anyhow::Result<Vec<TimeEntry>> {
        let rows = find_in::<time_entry::Entity>(scope)
            .filter(time_entry::Column::Status.eq(status.as_str()))
            .order_by_asc(time_entry::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list_by_status failed")?;
        entries_from(rows)
    }

    async fn statuses(
        &self,
        scope: &TenantScope,
        ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, EntryStatus>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, String)> = find_in::<time_entry::Entity>(scope)
            .select_only()
            .column(time_entry::Column::Id)
            .column(time_entry::Column::Status)
            .filter(time_entry::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("load entry statuses failed")?;

        rows.into_iter()
            .map(|(id, raw)| {
                EntryStatus::parse(&raw)
                    .map(|status| (id, status))
                    .ok_or_else(|| anyhow::anyhow!("unknown entry status '{}' on {}", raw, id))
            })
            .collect()
    }

    async fn record_decision(
        &self,
        scope: &TenantScope,
        id: Uuid,
        from: EntryStatus,
        to: EntryStatus,
        at: DateTime<Utc>,
        notice: Notification,
    ) -> anyhow::Result<bool> {
        anyhow::ensure!(
            notice.tenant_id == scope.tenant_id(),
            "notification {} does not belong to tenant {}",
            notice.id,
            scope.tenant_id()
        );
        let notice = notification_to_active(notice)?;

        // Dropping `txn` on any error below rolls it back
        let txn = self
            .conn
            .begin()
            .await
            .context("begin decision transaction failed")?;

        let res = update_in::<time_entry::Entity>(scope)
            .col_expr(time_entry::Column::Status, Expr::value(to.as_str()))
            .col_expr(time_entry::Column::UpdatedAt, Expr::value(at))
            .filter(time_entry::Column::Id.eq(id))
            .filter(time_entry::Column::Status.eq(from.as_str()))
            .exec(&txn)
            .await
            .context("compare-and-set entry status failed")?;
        if res.rows_affected != 1 {
            txn.rollback()
                .await
                .context("rollback decision transaction failed")?;
            return Ok(false);
        }

        notification::Entity::insert(notice)
            .exec_without_returning(&txn)
            .await
            .context("insert decision notification failed")?;

        txn.commit()
            .await
            .context("commit decision transaction failed")?;
        Ok(true)
    }
}

/// SeaORM repository for the notification inbox.
pub struct SeaOrmNotificationRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmNotificationRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> NotificationRepository for SeaOrmNotificationRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert(&self, scope: &TenantScope, n: Notification) -> anyhow::Result<()> {
        anyhow::ensure!(
            n.tenant_id == scope.tenant_id(),
            "notification {} does not belong to tenant {}",
            n.id,
            scope.tenant_id()
        );
        notification::Entity::insert(notification_to_active(n)?)
            .exec_without_returning(&self.conn)
            .await
            .context("insert notification failed")?;
        Ok(())
    }

    async fn insert_if_absent(&self, scope: &TenantScope, n: Notification) -> anyhow::Result<bool> {
        anyhow::ensure!(
            n.tenant_id == scope.tenant_id(),
            "notification {} does not belong to tenant {}",
            n.id,
            scope.tenant_id()
        );
        let inserted = notification::Entity::insert(notification_to_active(n)?)
            .on_conflict(
                OnConflict::column(notification::Column::DedupeKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("insert_if_absent failed")?;
        Ok(inserted > 0)
    }

    async fn find(&self, scope: &TenantScope, id: Uuid) -> anyhow::Result<Option<Notification>> {
        let found = find_in::<notification::Entity>(scope)
            .filter(notification::Column::Id.eq(id))
            .one(&self.conn)
            .await
            .context("find notification failed")?;
        found.map(Notification::try_from).transpose()
    }

    async fn list_for_recipient(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        unread_only: bool,
        limit: u64,
    ) -> anyhow::Result<Vec<Notification>> {
        let mut query = find_in::<notification::Entity>(scope)
            .filter(notification::Column::RecipientId.eq(recipient_id));
        if unread_only {
            query = query.filter(notification::Column::Read.eq(false));
        }
        let rows = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("list notifications failed")?;
        notifications_from(rows)
    }

    async fn count_unread(&self, scope: &TenantScope, recipient_id: Uuid) -> anyhow::Result<u64> {
        find_in::<notification::Entity>(scope)
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::Read.eq(false))
            .count(&self.conn)
            .await
            .context("count unread failed")
    }

    async fn pending_approval_keys(
        &self,
        scope: &TenantScope,
        entry_ids: &[Uuid],
    ) -> anyhow::Result<HashSet<(Uuid, Uuid)>> {
        if entry_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows: Vec<(Option<Uuid>, Uuid)> = find_in::<notification::Entity>(scope)
            .select_only()
            .column(notification::Column::RelatedEntryId)
            .column(notification::Column::RecipientId)
            .filter(notification::Column::Kind.eq(pending_approval_kind()))
            .filter(notification::Column::RelatedEntryId.is_in(entry_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("load pending-approval keys failed")?;
        Ok(rows
            .into_iter()
            .filter_map(|(entry_id, recipient_id)| entry_id.map(|e| (e, recipient_id)))
            .collect())
    }

    async fn unread_pending_approval(
        &self,
        scope: &TenantScope,
    ) -> anyhow::Result<Vec<Notification>> {
        let rows = find_in::<notification::Entity>(scope)
            .filter(notification::Column::Kind.eq(pending_approval_kind()))
            .filter(notification::Column::Read.eq(false))
            .filter(notification::Column::RelatedEntryId.is_not_null())
            .all(&self.conn)
            .await
            .context("load unread pending-approval notices failed")?;
        notifications_from(rows)
    }

    async fn mark_read(
        &self,
        scope: &TenantScope,
        ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let res = update_in::<notification::Entity>(scope)
            .col_expr(notification::Column::Read, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(Some(at)))
            .filter(notification::Column::Id.is_in(ids.iter().copied()))
            .filter(notification::Column::Read.eq(false))
            .exec(&self.conn)
            .await
            .context("mark_read failed")?;
        Ok(res.rows_affected)
    }

    async fn mark_all_read(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        at: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let res = update_in::<notification::Entity>(scope)
            .col_expr(notification::Column::Read, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(Some(at)))
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::Read.eq(false))
            .exec(&self.conn)
            .await
            .context("mark_all_read failed")?;
        Ok(res.rows_affected)
    }

    async fn delete(&self, scope: &TenantScope, id: Uuid) -> anyhow::Result<bool> {
        let res = delete_in::<notification::Entity>(scope)
            .filter(notification::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("delete notification failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete_older_than(
        &self,
        scope: &TenantScope,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let res = delete_in::<notification::Entity>(scope)
            .filter(notification::Column::CreatedAt.lt(cutoff))
            .exec(&self.conn)
            .await
            .context("delete_older_than failed")?;
        Ok(res.rows_affected)
    }
}

/// Directory adapter over the `tenant_members` table.
pub struct SeaOrmDirectory<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmDirectory<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// Insert or update a member; used for provisioning and tests.
    pub async fn upsert_member(&self, member: Member) -> anyhow::Result<()> {
        tenant_member::Entity::insert(member_to_active(member))
            .on_conflict(
                OnConflict::columns([
                    tenant_member::Column::UserId,
                    tenant_member::Column::TenantId,
                ])
                .update_columns([
                    tenant_member::Column::DisplayName,
                    tenant_member::Column::Role,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("upsert member failed")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<C> DirectoryPort for SeaOrmDirectory<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn admins(&self, scope: &TenantScope) -> anyhow::Result<Vec<Member>> {
        let rows = find_in::<tenant_member::Entity>(scope)
            .filter(tenant_member::Column::Role.eq(Role::Admin.as_str()))
            .order_by_asc(tenant_member::Column::UserId)
            .all(&self.conn)
            .await
            .context("load admins failed")?;
        rows.into_iter().map(Member::try_from).collect()
    }

    async fn member(&self, scope: &TenantScope, user_id: Uuid) -> anyhow::Result<Option<Member>> {
        let found = find_in::<tenant_member::Entity>(scope)
            .filter(tenant_member::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("load member failed")?;
        found.map(Member::try_from).transpose()
    }

    async fn tenants(&self) -> anyhow::Result<Vec<Uuid>> {
        // The only unscoped read: it is how the worker discovers its scopes
        tenant_member::Entity::find()
            .select_only()
            .column(tenant_member::Column::TenantId)
            .distinct()
            .into_tuple::<Uuid>()
            .all(&self.conn)
            .await
            .context("list tenants failed")
    }
}
