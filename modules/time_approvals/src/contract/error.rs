use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeApprovalsError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error")]
    Internal,
}

impl TimeApprovalsError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for TimeApprovalsError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            Validation { field, message } => Self::validation(format!("{}: {}", field, message)),
            DuplicateEntry { owner_id, date } => Self::conflict(format!(
                "an entry for owner {} on {} already exists",
                owner_id, date
            )),
            EntryNotFound { id } => Self::not_found(format!("time entry {}", id)),
            NotificationNotFound { id } => Self::not_found(format!("notification {}", id)),
            Forbidden { reason } => Self::forbidden(reason),
            InvalidTransition { from, to } => {
                Self::conflict(format!("cannot move entry from {} to {}", from, to))
            }
            ConcurrentModification { id } => {
                Self::conflict(format!("time entry {} was modified concurrently", id))
            }
            Database { .. } => Self::internal(),
        }
    }
}
