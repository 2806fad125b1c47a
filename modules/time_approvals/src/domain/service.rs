use std::sync::Arc;

use crate::contract::model::Principal;
use crate::domain::approvals::ApprovalService;
use crate::domain::error::DomainError;
use crate::domain::events::NotificationEvent;
use crate::domain::inbox::InboxService;
use crate::domain::ports::{DirectoryPort, EventPublisher, InboxFeed};
use crate::domain::reconcile::Reconciler;
use crate::domain::repo::{NotificationRepository, TimeEntryRepository};
use crate::domain::templates::Locale;

/// Configuration shared by the domain services
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub standard_daily_minutes: i64,
    pub expected_daily_minutes: i64,
    pub locale: Locale,
    pub retention: chrono::Duration,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub max_observation_length: usize,
    pub max_note_length: usize,
    /// Widest range accepted by period summaries, in days.
    pub max_period_days: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            standard_daily_minutes: 480,
            expected_daily_minutes: 480,
            locale: Locale::En,
            retention: chrono::Duration::days(2),
            default_page_size: 50,
            max_page_size: 500,
            max_observation_length: 500,
            max_note_length: 1000,
            max_period_days: 366,
        }
    }
}

/// The module's domain services, wired over the same ports.
#[derive(Clone)]
pub struct Services {
    pub approvals: Arc<ApprovalService>,
    pub inbox: Arc<InboxService>,
    pub reconciler: Arc<Reconciler>,
}

impl Services {
    pub fn new(
        entries: Arc<dyn TimeEntryRepository>,
        notifications: Arc<dyn NotificationRepository>,
        directory: Arc<dyn DirectoryPort>,
        events: Arc<dyn EventPublisher<NotificationEvent>>,
        feed: Arc<dyn InboxFeed>,
        config: ServiceConfig,
    ) -> Self {
        let approvals = ApprovalService::new(
            entries.clone(),
            events.clone(),
            config.clone(),
        );
        let inbox = InboxService::new(
            notifications.clone(),
            directory.clone(),
            events.clone(),
            feed,
            config.clone(),
        );
        let reconciler = Reconciler::new(entries, notifications, directory, events, config);
        Self {
            approvals: Arc::new(approvals),
            inbox: Arc::new(inbox),
            reconciler: Arc::new(reconciler),
        }
    }
}

/// Capability gate for administrator-only operations.
pub(crate) fn require_admin(principal: &Principal, action: &str) -> Result<(), DomainError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "only administrators may {}",
            action
        )))
    }
}
