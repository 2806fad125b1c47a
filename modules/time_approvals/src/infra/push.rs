use futures::stream::{BoxStream, Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use uuid::Uuid;

use crate::contract::model::Notification;
use crate::domain::events::{NotificationEvent, PushItem};
use crate::domain::ports::{EventPublisher, InboxFeed};

/// In-process push channel for inserted notifications, built on
/// `tokio::sync::broadcast`.
///
/// The channel is bounded: a subscriber that falls behind loses the oldest
/// events instead of slowing publishers down, and receives a
/// [`PushItem::Resync`] in their place.
#[derive(Clone)]
pub struct NotificationBroadcaster {
    tx: broadcast::Sender<Notification>,
}

impl NotificationBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Errors (no active subscribers) are ignored.
    pub fn send(&self, value: Notification) {
        let _ = self.tx.send(value);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Every insert, with a resync marker wherever the receiver lagged.
    pub fn subscribe_stream(&self) -> impl Stream<Item = PushItem> {
        BroadcastStream::new(self.tx.subscribe()).map(|res| match res {
            Ok(n) => PushItem::Inserted(n),
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                tracing::debug!(missed, "Push subscriber lagged");
                PushItem::Resync { missed }
            }
        })
    }
}

impl EventPublisher<NotificationEvent> for NotificationBroadcaster {
    fn publish(&self, event: &NotificationEvent) {
        match event {
            NotificationEvent::Inserted(n) => self.send(n.clone()),
        }
    }
}

impl InboxFeed for NotificationBroadcaster {
    fn subscribe(&self, recipient_id: Uuid, tenant_id: Uuid) -> BoxStream<'static, PushItem> {
        // Dropped events may have been anyone's, so every resync is forwarded
        self.subscribe_stream()
            .filter(move |item| {
                let keep = match item {
                    PushItem::Inserted(n) => {
                        n.recipient_id == recipient_id && n.tenant_id == tenant_id
                    }
                    PushItem::Resync { .. } => true,
                };
                async move { keep }
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::NotificationPayload;
    use chrono::Utc;
    use tokio::time::{timeout, Duration};

    fn notice(recipient_id: Uuid, tenant_id: Uuid, note: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_id,
            tenant_id,
            title: "Reminder".into(),
            message: note.into(),
            payload: NotificationPayload::Reminder { note: note.into() },
            read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    async fn next_item(feed: &mut BoxStream<'static, PushItem>) -> PushItem {
        timeout(Duration::from_millis(200), feed.next())
            .await
            .expect("timeout")
            .expect("stream ended")
    }

    #[tokio::test]
    async fn subscriber_only_sees_own_inserts() {
        let b = NotificationBroadcaster::new(16);
        let me = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let mut feed = b.subscribe(me, tenant);

        b.publish(&NotificationEvent::Inserted(notice(Uuid::new_v4(), tenant, "other")));
        b.publish(&NotificationEvent::Inserted(notice(me, Uuid::new_v4(), "other tenant")));
        b.publish(&NotificationEvent::Inserted(notice(me, tenant, "mine")));

        match next_item(&mut feed).await {
            PushItem::Inserted(n) => assert_eq!(n.message, "mine"),
            other => panic!("unexpected push item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let b = NotificationBroadcaster::new(4);
        assert_eq!(b.subscriber_count(), 0);
        b.send(notice(Uuid::new_v4(), Uuid::new_v4(), "nobody listens"));
    }

    #[tokio::test]
    async fn lagging_subscriber_is_told_to_resync() {
        let b = NotificationBroadcaster::new(2);
        let me = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let mut feed = b.subscribe(me, tenant);

        for i in 0..5 {
            b.send(notice(me, tenant, &format!("n{i}")));
        }

        // n0..n2 were dropped and are reported instead of vanishing
        match next_item(&mut feed).await {
            PushItem::Resync { missed } => assert_eq!(missed, 3),
            other => panic!("expected resync, got {other:?}"),
        }
        match next_item(&mut feed).await {
            PushItem::Inserted(n) => assert_eq!(n.message, "n3"),
            other => panic!("unexpected push item: {other:?}"),
        }
        match next_item(&mut feed).await {
            PushItem::Inserted(n) => assert_eq!(n.message, "n4"),
            other => panic!("unexpected push item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn resync_reaches_every_recipient() {
        let b = NotificationBroadcaster::new(1);
        let me = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let mut feed = b.subscribe(me, tenant);

        // Only other users' notices overflow the buffer
        b.send(notice(Uuid::new_v4(), tenant, "a"));
        b.send(notice(Uuid::new_v4(), tenant, "b"));

        let got = next_item(&mut feed).await;
        assert!(matches!(got, PushItem::Resync { missed: 1 }));
    }
}
