pub mod client;
pub mod error;
pub mod model;

pub use client::TimeApprovalsApi;
pub use error::TimeApprovalsError;
pub use model::{
    EntryFilter, EntryStatus, InboxQuery, Member, NewNotice, NewTimeEntry, Notification,
    NotificationKind, NotificationPayload, Principal, Role, ShiftLeg, TenantScope, TimeEntry,
};
