use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.timesheet.dev/{}", code))
        .with_code(code)
        .with_instance(instance);

    // Attach the current span id if a request span is active
    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::Validation { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "TIME_VALIDATION",
            "Validation error",
            format!("{}", e),
            instance,
        ),
        DomainError::Forbidden { reason } => from_parts(
            StatusCode::FORBIDDEN,
            "TIME_FORBIDDEN",
            "Forbidden",
            reason.clone(),
            instance,
        ),
        DomainError::EntryNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "TIME_ENTRY_NOT_FOUND",
            "Time entry not found",
            format!("Time entry with id {} was not found", id),
            instance,
        ),
        DomainError::NotificationNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "NOTIFICATION_NOT_FOUND",
            "Notification not found",
            format!("Notification with id {} was not found", id),
            instance,
        ),
        DomainError::DuplicateEntry { date, .. } => from_parts(
            StatusCode::CONFLICT,
            "TIME_ENTRY_DUPLICATE",
            "Duplicate entry",
            format!("A time entry for {} already exists", date),
            instance,
        ),
        DomainError::InvalidTransition { from, to } => from_parts(
            StatusCode::CONFLICT,
            "TIME_ENTRY_INVALID_TRANSITION",
            "Invalid transition",
            format!("Time entry cannot move from {} to {}", from, to),
            instance,
        ),
        DomainError::ConcurrentModification { id } => from_parts(
            StatusCode::CONFLICT,
            "TIME_ENTRY_CONCURRENT_MODIFICATION",
            "Concurrent modification",
            format!("Time entry {} was changed by another request; reload and retry", id),
            instance,
        ),
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal error",
                "An internal database error occurred",
                instance,
            )
        }
    }
}
