use crate::contract::model::Notification;

/// Transport-agnostic domain event.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// A notification row was written.
    Inserted(Notification),
}

/// What a push subscriber receives.
#[derive(Debug, Clone)]
pub enum PushItem {
    /// A new notification for the subscriber.
    Inserted(Notification),
    /// The subscriber fell behind and `missed` pushes were dropped; re-fetch the inbox.
    Resync { missed: u64 },
}
