pub mod notification;
pub mod tenant_member;
pub mod time_entry;
