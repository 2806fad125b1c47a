use std::sync::Arc;

use chrono::Utc;
use futures::stream::BoxStream;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{InboxQuery, NewNotice, Notification, NotificationPayload, Principal};
use crate::domain::error::DomainError;
use crate::domain::events::{NotificationEvent, PushItem};
use crate::domain::ports::{DirectoryPort, EventPublisher, InboxFeed};
use crate::domain::repo::NotificationRepository;
use crate::domain::service::{require_admin, ServiceConfig};
use crate::domain::templates;

/// Read side of the notification inbox plus its push feed.
/// Callers only ever see and touch their own notifications.
#[derive(Clone)]
pub struct InboxService {
    notifications: Arc<dyn NotificationRepository>,
    directory: Arc<dyn DirectoryPort>,
    events: Arc<dyn EventPublisher<NotificationEvent>>,
    feed: Arc<dyn InboxFeed>,
    config: ServiceConfig,
}

impl InboxService {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        directory: Arc<dyn DirectoryPort>,
        events: Arc<dyn EventPublisher<NotificationEvent>>,
        feed: Arc<dyn InboxFeed>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            notifications,
            directory,
            events,
            feed,
            config,
        }
    }

    #[instrument(
        name = "time_approvals.service.list_notifications",
        skip(self, principal),
        fields(recipient_id = %principal.user_id)
    )]
    pub async fn list(
        &self,
        principal: &Principal,
        query: InboxQuery,
    ) -> Result<Vec<Notification>, DomainError> {
        let limit = match query.limit {
            Some(0) => return Err(DomainError::validation("limit", "must be positive")),
            Some(l) => l.min(self.config.max_page_size),
            None => self.config.default_page_size,
        };

        let items = self
            .notifications
            .list_for_recipient(
                &principal.scope(),
                principal.user_id,
                query.unread_only,
                u64::from(limit),
            )
            .await?;
        debug!("Listed {} notifications", items.len());
        Ok(items)
    }

    #[instrument(
        name = "time_approvals.service.unread_count",
        skip(self, principal),
        fields(recipient_id = %principal.user_id)
    )]
    pub async fn unread_count(&self, principal: &Principal) -> Result<u64, DomainError> {
        Ok(self
            .notifications
            .count_unread(&principal.scope(), principal.user_id)
            .await?)
    }

    #[instrument(
        name = "time_approvals.service.mark_read",
        skip(self, principal),
        fields(notification_id = %id, recipient_id = %principal.user_id)
    )]
    pub async fn mark_read(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError> {
        let notification = self.own_notification(principal, id).await?;
        if notification.read {
            debug!("Notification already read");
            return Ok(());
        }
        self.notifications
            .mark_read(&principal.scope(), &[id], Utc::now())
            .await?;
        Ok(())
    }

    #[instrument(
        name = "time_approvals.service.mark_all_read",
        skip(self, principal),
        fields(recipient_id = %principal.user_id)
    )]
    pub async fn mark_all_read(&self, principal: &Principal) -> Result<u64, DomainError> {
        let changed = self
            .notifications
            .mark_all_read(&principal.scope(), principal.user_id, Utc::now())
            .await?;
        debug!("Marked {} notifications read", changed);
        Ok(changed)
    }

    #[instrument(
        name = "time_approvals.service.delete_notification",
        skip(self, principal),
        fields(notification_id = %id, recipient_id = %principal.user_id)
    )]
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError> {
        self.own_notification(principal, id).await?;
        if !self.notifications.delete(&principal.scope(), id).await? {
            return Err(DomainError::notification_not_found(id));
        }
        info!("Deleted notification");
        Ok(())
    }

    #[instrument(
        name = "time_approvals.service.send_notice",
        skip(self, principal, notice),
        fields(sender_id = %principal.user_id, recipient_id = %notice.recipient_id, kind = %notice.kind)
    )]
    pub async fn send_notice(
        &self,
        principal: &Principal,
        notice: NewNotice,
    ) -> Result<Notification, DomainError> {
        require_admin(principal, "send notices")?;

        let note = notice.note.trim().to_string();
        if note.is_empty() {
            return Err(DomainError::validation("note", "must not be empty"));
        }
        if note.chars().count() > self.config.max_note_length {
            return Err(DomainError::validation(
                "note",
                format!("must be at most {} characters", self.config.max_note_length),
            ));
        }
        let payload = NotificationPayload::notice(notice.kind, note).ok_or_else(|| {
            DomainError::validation("kind", "only reminder, report and system notices can be sent")
        })?;

        let scope = principal.scope();
        if self
            .directory
            .member(&scope, notice.recipient_id)
            .await?
            .is_none()
        {
            return Err(DomainError::validation(
                "recipient_id",
                "is not a member of this tenant",
            ));
        }

        let notification = templates::compose(
            notice.recipient_id,
            principal.tenant_id,
            payload,
            self.config.locale,
            Utc::now(),
        );
        self.notifications
            .insert(&scope, notification.clone())
            .await?;
        self.events
            .publish(&NotificationEvent::Inserted(notification.clone()));

        info!(notification_id = %notification.id, "Notice sent");
        Ok(notification)
    }

    /// Live inserts for the caller. Treat each item as a hint to re-fetch.
    pub fn subscribe(&self, principal: &Principal) -> BoxStream<'static, PushItem> {
        self.feed.subscribe(principal.user_id, principal.tenant_id)
    }

    async fn own_notification(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<Notification, DomainError> {
        match self.notifications.find(&principal.scope(), id).await? {
            Some(n) if n.recipient_id == principal.user_id => Ok(n),
            _ => Err(DomainError::notification_not_found(id)),
        }
    }
}
