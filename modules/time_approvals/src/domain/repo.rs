use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::contract::model::{EntryFilter, EntryStatus, Notification, TenantScope, TimeEntry};

/// Result of an insert guarded by a storage-level uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// Persistence port for time entries. Every call is confined to `scope`.
#[async_trait]
pub trait TimeEntryRepository: Send + Sync {
    async fn find(&self, scope: &TenantScope, id: Uuid) -> anyhow::Result<Option<TimeEntry>>;

    async fn find_by_owner_and_date(
        &self,
        scope: &TenantScope,
        owner_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<Option<TimeEntry>>;

    /// Insert a fully-formed entry. `(tenant_id, owner_id, date)` is unique.
    async fn insert(&self, scope: &TenantScope, entry: TimeEntry) -> anyhow::Result<InsertOutcome>;

    /// Entries matching `filter`, ordered by date.
    async fn list(&self, scope: &TenantScope, filter: &EntryFilter)
        -> anyhow::Result<Vec<TimeEntry>>;

    async fn list_by_status(
        &self,
        scope: &TenantScope,
        status: EntryStatus,
    ) -> anyhow::Result<Vec<TimeEntry>>;

    /// Current status of each id that still exists.
    async fn statuses(
        &self,
        scope: &TenantScope,
        ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, EntryStatus>>;

    /// Set `to` only while the stored status is still `from`, and store the
    /// owner's `notice` in the same transaction: both land or neither does.
    /// Returns false, writing nothing, when another writer got there first.
    async fn record_decision(
        &self,
        scope: &TenantScope,
        id: Uuid,
        from: EntryStatus,
        to: EntryStatus,
        at: DateTime<Utc>,
        notice: Notification,
    ) -> anyhow::Result<bool>;
}

/// Persistence port for the notification inbox. Every call is confined to `scope`.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, scope: &TenantScope, n: Notification) -> anyhow::Result<()>;

    /// Insert unless a notification with the same idempotency key exists.
    /// Returns true if a row was written.
    async fn insert_if_absent(&self, scope: &TenantScope, n: Notification) -> anyhow::Result<bool>;

    async fn find(&self, scope: &TenantScope, id: Uuid) -> anyhow::Result<Option<Notification>>;

    /// Newest first.
    async fn list_for_recipient(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        unread_only: bool,
        limit: u64,
    ) -> anyhow::Result<Vec<Notification>>;

    async fn count_unread(&self, scope: &TenantScope, recipient_id: Uuid) -> anyhow::Result<u64>;

    /// `(related_entry_id, recipient_id)` of pending-approval notifications
    /// for the given entries, in any read state.
    async fn pending_approval_keys(
        &self,
        scope: &TenantScope,
        entry_ids: &[Uuid],
    ) -> anyhow::Result<HashSet<(Uuid, Uuid)>>;

    /// Unread pending-approval notifications that reference an entry.
    async fn unread_pending_approval(&self, scope: &TenantScope)
        -> anyhow::Result<Vec<Notification>>;

    /// Mark the given unread notifications read. Returns rows changed.
    async fn mark_read(
        &self,
        scope: &TenantScope,
        ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> anyhow::Result<u64>;

    async fn mark_all_read(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        at: DateTime<Utc>,
    ) -> anyhow::Result<u64>;

    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, scope: &TenantScope, id: Uuid) -> anyhow::Result<bool>;

    /// Delete every notification created before `cutoff`, read or not.
    async fn delete_older_than(
        &self,
        scope: &TenantScope,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<u64>;
}
