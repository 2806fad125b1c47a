//! Reconciliation of the notification inbox against entry state.
//!
//! A tick runs four passes for one tenant, in order: discover pending
//! entries, create missing pending-approval notices for the tenant's
//! admins, close notices whose entry is no longer pending, and prune
//! everything past the retention window. Each pass is idempotent and
//! fail-soft; a failed pass is logged, reported and retried next tick.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    EntryStatus, NotificationPayload, Pass, Principal, TenantScope, TickReport, TimeEntry,
};
use crate::domain::error::DomainError;
use crate::domain::events::NotificationEvent;
use crate::domain::ports::{DirectoryPort, EventPublisher};
use crate::domain::repo::{NotificationRepository, TimeEntryRepository};
use crate::domain::service::{require_admin, ServiceConfig};
use crate::domain::templates;

#[derive(Clone)]
pub struct Reconciler {
    entries: Arc<dyn TimeEntryRepository>,
    notifications: Arc<dyn NotificationRepository>,
    directory: Arc<dyn DirectoryPort>,
    events: Arc<dyn EventPublisher<NotificationEvent>>,
    config: ServiceConfig,
}

impl Reconciler {
    pub fn new(
        entries: Arc<dyn TimeEntryRepository>,
        notifications: Arc<dyn NotificationRepository>,
        directory: Arc<dyn DirectoryPort>,
        events: Arc<dyn EventPublisher<NotificationEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            entries,
            notifications,
            directory,
            events,
            config,
        }
    }

    /// Run one tick for the caller's tenant on demand.
    #[instrument(
        name = "time_approvals.service.reconcile_now",
        skip(self, principal),
        fields(admin_id = %principal.user_id, tenant_id = %principal.tenant_id)
    )]
    pub async fn run_now(&self, principal: &Principal) -> Result<TickReport, DomainError> {
        require_admin(principal, "run reconciliation")?;
        Ok(self.tick(&principal.scope()).await)
    }

    /// One tick for every tenant the directory knows about.
    pub async fn tick_all(&self) -> Vec<TickReport> {
        let tenants = match self.directory.tenants().await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Failed to list tenants; skipping tick");
                return Vec::new();
            }
        };

        let mut reports = Vec::with_capacity(tenants.len());
        for tenant_id in tenants {
            reports.push(self.tick(&TenantScope::new(tenant_id)).await);
        }
        reports
    }

    #[instrument(
        name = "time_approvals.reconcile.tick",
        skip(self, scope),
        fields(tenant_id = %scope.tenant_id())
    )]
    pub async fn tick(&self, scope: &TenantScope) -> TickReport {
        let mut report = TickReport::new(scope.tenant_id());

        let pending = match self.discover(scope).await {
            Ok(pending) => {
                report.discovered = pending.len();
                Some(pending)
            }
            Err(e) => {
                fail(&mut report, Pass::Discover, &e);
                None
            }
        };

        // Creating needs the discovered set; without it the pass is skipped
        match pending {
            Some(pending) => match self.create_missing(scope, &pending).await {
                Ok(n) => report.created = n,
                Err(e) => fail(&mut report, Pass::CreateMissing, &e),
            },
            None => report.failed.push(Pass::CreateMissing),
        }

        match self.close_stale(scope).await {
            Ok(n) => report.closed = n,
            Err(e) => fail(&mut report, Pass::CloseStale, &e),
        }

        match self.retain(scope, Utc::now()).await {
            Ok(n) => report.pruned = n,
            Err(e) => fail(&mut report, Pass::Retain, &e),
        }

        if report.changed_anything() {
            info!(
                discovered = report.discovered,
                created = report.created,
                closed = report.closed,
                pruned = report.pruned,
                failed = report.failed.len(),
                "Reconciliation tick finished"
            );
        } else {
            debug!(
                discovered = report.discovered,
                failed = report.failed.len(),
                "Reconciliation tick finished"
            );
        }
        report
    }

    /// Pass 1: pending entries of the tenant.
    #[instrument(name = "time_approvals.reconcile.discover", skip_all)]
    pub async fn discover(&self, scope: &TenantScope) -> anyhow::Result<Vec<TimeEntry>> {
        self.entries
            .list_by_status(scope, EntryStatus::Pending)
            .await
            .context("discover pending entries")
    }

    /// Pass 2: one pending-approval notice per `(entry, admin)` pair,
    /// never addressed to the entry's owner. Returns rows actually inserted.
    #[instrument(name = "time_approvals.reconcile.create_missing", skip_all, fields(pending = pending.len()))]
    pub async fn create_missing(
        &self,
        scope: &TenantScope,
        pending: &[TimeEntry],
    ) -> anyhow::Result<u64> {
        if pending.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = pending.iter().map(|e| e.id).collect();
        let existing = self
            .notifications
            .pending_approval_keys(scope, &ids)
            .await
            .context("load existing pending-approval notices")?;
        let admins = self
            .directory
            .admins(scope)
            .await
            .context("load admin roster")?;

        let mut owner_names: HashMap<Uuid, String> = HashMap::new();
        let mut created = 0;
        let now = Utc::now();

        for entry in pending {
            let recipients: Vec<Uuid> = admins
                .iter()
                .map(|a| a.user_id)
                .filter(|admin_id| *admin_id != entry.owner_id)
                .filter(|admin_id| !existing.contains(&(entry.id, *admin_id)))
                .collect();
            if recipients.is_empty() {
                continue;
            }

            let owner_name = match owner_names.get(&entry.owner_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .directory
                        .member(scope, entry.owner_id)
                        .await
                        .context("load entry owner")?
                        .map(|m| m.display_name)
                        .unwrap_or_else(|| entry.owner_id.to_string());
                    owner_names.insert(entry.owner_id, name.clone());
                    name
                }
            };

            for recipient_id in recipients {
                let notification = templates::compose(
                    recipient_id,
                    scope.tenant_id(),
                    NotificationPayload::PendingApproval {
                        entry_id: entry.id,
                        owner_id: entry.owner_id,
                        owner_name: owner_name.clone(),
                        entry_date: entry.date,
                    },
                    self.config.locale,
                    now,
                );
                // Another worker may have won the race; the storage key decides
                if self
                    .notifications
                    .insert_if_absent(scope, notification.clone())
                    .await
                    .context("insert pending-approval notice")?
                {
                    created += 1;
                    self.events
                        .publish(&NotificationEvent::Inserted(notification));
                }
            }
        }
        Ok(created)
    }

    /// Pass 3: mark read every unread pending-approval notice whose entry
    /// is no longer pending (or no longer exists).
    #[instrument(name = "time_approvals.reconcile.close_stale", skip_all)]
    pub async fn close_stale(&self, scope: &TenantScope) -> anyhow::Result<u64> {
        let unread = self
            .notifications
            .unread_pending_approval(scope)
            .await
            .context("load unread pending-approval notices")?;
        if unread.is_empty() {
            return Ok(0);
        }

        let referenced: Vec<Uuid> = unread
            .iter()
            .filter_map(|n| n.related_entry_id())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let statuses = self
            .entries
            .statuses(scope, &referenced)
            .await
            .context("load referenced entry statuses")?;

        let stale: Vec<Uuid> = unread
            .iter()
            .filter(|n| {
                n.related_entry_id()
                    .and_then(|entry_id| statuses.get(&entry_id))
                    != Some(&EntryStatus::Pending)
            })
            .map(|n| n.id)
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }

        self.notifications
            .mark_read(scope, &stale, Utc::now())
            .await
            .context("mark stale notices read")
    }

    /// Pass 4: delete notifications older than the retention window.
    #[instrument(name = "time_approvals.reconcile.retain", skip_all)]
    pub async fn retain(&self, scope: &TenantScope, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let cutoff = now - self.config.retention;
        self.notifications
            .delete_older_than(scope, cutoff)
            .await
            .context("prune expired notifications")
    }
}

fn fail(report: &mut TickReport, pass: Pass, e: &anyhow::Error) {
    warn!(pass = %pass, error = %format!("{:#}", e), "Reconciliation pass failed");
    report.failed.push(pass);
}
