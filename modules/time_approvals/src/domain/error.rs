use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::EntryStatus;

/// Domain-specific errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Entry for owner {owner_id} on {date} already exists")]
    DuplicateEntry { owner_id: Uuid, date: NaiveDate },

    #[error("Time entry not found: {id}")]
    EntryNotFound { id: Uuid },

    #[error("Notification not found: {id}")]
    NotificationNotFound { id: Uuid },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: EntryStatus, to: EntryStatus },

    #[error("Time entry {id} was modified concurrently")]
    ConcurrentModification { id: Uuid },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn duplicate_entry(owner_id: Uuid, date: NaiveDate) -> Self {
        Self::DuplicateEntry { owner_id, date }
    }

    pub fn entry_not_found(id: Uuid) -> Self {
        Self::EntryNotFound { id }
    }

    pub fn notification_not_found(id: Uuid) -> Self {
        Self::NotificationNotFound { id }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn invalid_transition(from: EntryStatus, to: EntryStatus) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn concurrent_modification(id: Uuid) -> Self {
        Self::ConcurrentModification { id }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for DomainError {
    fn from(e: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line
        Self::database(format!("{:#}", e))
    }
}
