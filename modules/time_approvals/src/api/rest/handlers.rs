use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::rest::auth::Caller;
use crate::api::rest::dto::{
    CreateEntryReq, InboxParams, ListEntriesQuery, MarkAllReadDto, NotificationDto,
    NotificationListDto, PeriodQuery, PeriodSummaryDto, RejectReq, ResyncDto, SendNoticeReq,
    TickReportDto, TimeEntryDto, TimeEntryListDto, UnreadCountDto, WeekQuery, WeeklyBucketDto,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::api::rest::sse::{json_event, sse_response, NOTIFICATION_EVENT, RESYNC_EVENT};
use crate::contract::model::{NewNotice, TimeEntry};
use crate::domain::approvals::ApprovalService;
use crate::domain::events::PushItem;
use crate::domain::inbox::InboxService;
use crate::domain::reconcile::Reconciler;

fn entry_dto(svc: &ApprovalService, entry: TimeEntry) -> TimeEntryDto {
    let summary = svc.daily_summary(&entry);
    TimeEntryDto::new(entry, summary)
}

/// Record a time entry for the caller
#[utoipa::path(
    post,
    path = "/time-entries",
    tag = "time-entries",
    request_body = CreateEntryReq,
    responses(
        (status = 201, description = "Entry created in pending state", body = TimeEntryDto),
        (status = 400, description = "Validation error", body = Problem),
        (status = 409, description = "An entry already exists for that day", body = Problem),
    )
)]
pub async fn create_entry(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<ApprovalService>>,
    Json(req_body): Json<CreateEntryReq>,
) -> Result<(StatusCode, Json<TimeEntryDto>), ProblemResponse> {
    info!("Creating time entry for {}", req_body.date);

    match svc.create_entry(&principal, req_body.into()).await {
        Ok(entry) => Ok((StatusCode::CREATED, Json(entry_dto(&svc, entry)))),
        Err(e) => {
            warn!("Failed to create time entry: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// List entries; employees only see their own
#[utoipa::path(
    get,
    path = "/time-entries",
    tag = "time-entries",
    params(ListEntriesQuery),
    responses(
        (status = 200, description = "Entries ordered by date", body = TimeEntryListDto),
        (status = 400, description = "Validation error", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
    )
)]
pub async fn list_entries(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<ApprovalService>>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<TimeEntryListDto>, ProblemResponse> {
    let entries = svc
        .list_entries(&principal, query.into())
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    let items: Vec<TimeEntryDto> = entries.into_iter().map(|e| entry_dto(&svc, e)).collect();
    Ok(Json(TimeEntryListDto {
        total: items.len(),
        items,
    }))
}

/// Entries awaiting a decision in the caller's tenant (admin only)
#[utoipa::path(
    get,
    path = "/time-entries/pending",
    tag = "time-entries",
    responses(
        (status = 200, description = "Pending entries", body = TimeEntryListDto),
        (status = 403, description = "Forbidden", body = Problem),
    )
)]
pub async fn list_pending(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<ApprovalService>>,
) -> Result<Json<TimeEntryListDto>, ProblemResponse> {
    let entries = svc
        .list_pending(&principal)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    let items: Vec<TimeEntryDto> = entries.into_iter().map(|e| entry_dto(&svc, e)).collect();
    Ok(Json(TimeEntryListDto {
        total: items.len(),
        items,
    }))
}

#[utoipa::path(
    get,
    path = "/time-entries/{id}",
    tag = "time-entries",
    params(("id" = Uuid, Path, description = "Time entry id")),
    responses(
        (status = 200, description = "Entry found", body = TimeEntryDto),
        (status = 404, description = "Not found", body = Problem),
    )
)]
pub async fn get_entry(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<ApprovalService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimeEntryDto>, ProblemResponse> {
    match svc.get_entry(&principal, id).await {
        Ok(entry) => Ok(Json(entry_dto(&svc, entry))),
        Err(e) => Err(map_domain_error(&e, uri.path())),
    }
}

/// Approve an entry (admin only)
#[utoipa::path(
    post,
    path = "/time-entries/{id}/approve",
    tag = "time-entries",
    params(("id" = Uuid, Path, description = "Time entry id")),
    responses(
        (status = 200, description = "Entry approved; owner notified", body = TimeEntryDto),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Already approved or changed concurrently", body = Problem),
    )
)]
pub async fn approve_entry(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<ApprovalService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimeEntryDto>, ProblemResponse> {
    info!("Approving time entry {}", id);

    match svc.approve(&principal, id).await {
        Ok(entry) => Ok(Json(entry_dto(&svc, entry))),
        Err(e) => {
            warn!("Failed to approve time entry {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Reject an entry with an optional reason (admin only)
#[utoipa::path(
    post,
    path = "/time-entries/{id}/reject",
    tag = "time-entries",
    params(("id" = Uuid, Path, description = "Time entry id")),
    request_body = RejectReq,
    responses(
        (status = 200, description = "Entry rejected; owner notified", body = TimeEntryDto),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Already rejected or changed concurrently", body = Problem),
    )
)]
pub async fn reject_entry(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<ApprovalService>>,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectReq>>,
) -> Result<Json<TimeEntryDto>, ProblemResponse> {
    info!("Rejecting time entry {}", id);

    let reason = body.and_then(|Json(req)| req.reason);
    match svc.reject(&principal, id, reason).await {
        Ok(entry) => Ok(Json(entry_dto(&svc, entry))),
        Err(e) => {
            warn!("Failed to reject time entry {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Caller's week (Monday first) with per-day worked minutes
#[utoipa::path(
    get,
    path = "/time-entries/summary/week",
    tag = "time-entries",
    params(WeekQuery),
    responses((status = 200, description = "Weekly buckets", body = WeeklyBucketDto))
)]
pub async fn weekly_summary(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<ApprovalService>>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeeklyBucketDto>, ProblemResponse> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    let week = svc
        .weekly_summary(&principal, today)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(week.into()))
}

/// Caller's totals and signed balance over a date range
#[utoipa::path(
    get,
    path = "/time-entries/summary/period",
    tag = "time-entries",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Period totals", body = PeriodSummaryDto),
        (status = 400, description = "Invalid range", body = Problem),
    )
)]
pub async fn period_summary(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<ApprovalService>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodSummaryDto>, ProblemResponse> {
    let summary = svc
        .period_summary(&principal, query.from, query.to)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(summary.into()))
}

/// Caller's inbox, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    params(InboxParams),
    responses(
        (status = 200, description = "Notifications", body = NotificationListDto),
        (status = 400, description = "Invalid limit", body = Problem),
    )
)]
pub async fn list_notifications(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<InboxService>>,
    Query(params): Query<InboxParams>,
) -> Result<Json<NotificationListDto>, ProblemResponse> {
    let items = svc
        .list(&principal, params.into())
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(NotificationListDto {
        items: items.into_iter().map(NotificationDto::from).collect(),
        limit: params.limit,
    }))
}

#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "notifications",
    responses((status = 200, description = "Unread notifications of the caller", body = UnreadCountDto))
)]
pub async fn unread_count(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<InboxService>>,
) -> Result<Json<UnreadCountDto>, ProblemResponse> {
    let unread = svc
        .unread_count(&principal)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(UnreadCountDto { unread }))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Not found", body = Problem),
    )
)]
pub async fn mark_read(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<InboxService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ProblemResponse> {
    svc.mark_read(&principal, id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "notifications",
    responses((status = 200, description = "Number of notifications marked read", body = MarkAllReadDto))
)]
pub async fn mark_all_read(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<InboxService>>,
) -> Result<Json<MarkAllReadDto>, ProblemResponse> {
    let updated = svc
        .mark_all_read(&principal)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(MarkAllReadDto { updated }))
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = Problem),
    )
)]
pub async fn delete_notification(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<InboxService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting notification: {}", id);

    match svc.delete(&principal, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            warn!("Failed to delete notification {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Send a reminder, report or system notice to a tenant member (admin only)
#[utoipa::path(
    post,
    path = "/notifications/notices",
    tag = "notifications",
    request_body = SendNoticeReq,
    responses(
        (status = 201, description = "Notice created", body = NotificationDto),
        (status = 400, description = "Validation error", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
    )
)]
pub async fn send_notice(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<InboxService>>,
    Json(req_body): Json<SendNoticeReq>,
) -> Result<(StatusCode, Json<NotificationDto>), ProblemResponse> {
    let notice =
        NewNotice::try_from(req_body).map_err(|e| map_domain_error(&e, uri.path()))?;
    let created = svc
        .send_notice(&principal, notice)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Live stream of the caller's new notifications (SSE, event `notification`).
/// A `resync` event means pushes were dropped and the inbox should be re-fetched.
#[utoipa::path(
    get,
    path = "/notifications/events",
    tag = "notifications",
    responses((status = 200, description = "SSE stream of NotificationDto, with ResyncDto on `resync` events", content_type = "text/event-stream", body = NotificationDto))
)]
pub async fn notification_events(
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<InboxService>>,
) -> impl IntoResponse {
    info!(recipient_id = %principal.user_id, "New SSE connection for notifications");
    let stream = futures::StreamExt::map(svc.subscribe(&principal), |item| match item {
        PushItem::Inserted(n) => json_event(NOTIFICATION_EVENT, &NotificationDto::from(n)),
        PushItem::Resync { missed } => json_event(RESYNC_EVENT, &ResyncDto { missed }),
    });
    sse_response(stream)
}

/// Run one reconciliation tick for the caller's tenant (admin only)
#[utoipa::path(
    post,
    path = "/reconcile",
    tag = "reconcile",
    responses(
        (status = 200, description = "Tick report", body = TickReportDto),
        (status = 403, description = "Forbidden", body = Problem),
    )
)]
pub async fn reconcile_now(
    uri: Uri,
    Caller(principal): Caller,
    Extension(svc): Extension<Arc<Reconciler>>,
) -> Result<Json<TickReportDto>, ProblemResponse> {
    info!("Manual reconciliation requested");
    let report = svc
        .run_now(&principal)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(report.into()))
}
