use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use tower_http::timeout::TimeoutLayer;

use crate::api::rest::handlers;
use crate::domain::service::Services;

/// Long-lived SSE connections get their own, much wider timeout
const EVENTS_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub fn register_routes(router: Router, services: &Services) -> anyhow::Result<Router> {
    // Entries and summaries. Static segments win over `{id}` in axum's matcher.
    let entries = Router::new()
        .route(
            "/time-entries",
            post(handlers::create_entry).get(handlers::list_entries),
        )
        .route("/time-entries/pending", get(handlers::list_pending))
        .route("/time-entries/summary/week", get(handlers::weekly_summary))
        .route("/time-entries/summary/period", get(handlers::period_summary))
        .route("/time-entries/{id}", get(handlers::get_entry))
        .route("/time-entries/{id}/approve", post(handlers::approve_entry))
        .route("/time-entries/{id}/reject", post(handlers::reject_entry))
        .layer(Extension(services.approvals.clone()));

    let inbox = Router::new()
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/unread-count", get(handlers::unread_count))
        .route("/notifications/read-all", post(handlers::mark_all_read))
        .route("/notifications/notices", post(handlers::send_notice))
        .route(
            "/notifications/{id}",
            axum::routing::delete(handlers::delete_notification),
        )
        .route("/notifications/{id}/read", post(handlers::mark_read))
        .layer(Extension(services.inbox.clone()));

    let events = Router::new()
        .route("/notifications/events", get(handlers::notification_events))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            EVENTS_TIMEOUT,
        ))
        .layer(Extension(services.inbox.clone()));

    let reconcile = Router::new()
        .route("/reconcile", post(handlers::reconcile_now))
        .layer(Extension(services.reconciler.clone()));

    Ok(router
        .merge(entries)
        .merge(inbox)
        .merge(events)
        .merge(reconcile))
}
