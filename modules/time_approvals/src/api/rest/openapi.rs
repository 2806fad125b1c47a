use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::rest::auth::{TENANT_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::api::rest::{dto, handlers, problem};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timesheet approvals API",
        description = "Time entries, approvals, hour balances and the notification inbox. \
                       Callers identify themselves with the x-user-id, x-tenant-id and x-user-role headers."
    ),
    paths(
        handlers::create_entry,
        handlers::list_entries,
        handlers::list_pending,
        handlers::get_entry,
        handlers::approve_entry,
        handlers::reject_entry,
        handlers::weekly_summary,
        handlers::period_summary,
        handlers::list_notifications,
        handlers::unread_count,
        handlers::mark_read,
        handlers::mark_all_read,
        handlers::delete_notification,
        handlers::send_notice,
        handlers::notification_events,
        handlers::reconcile_now,
    ),
    components(schemas(
        dto::ShiftDto,
        dto::CreateEntryReq,
        dto::DailySummaryDto,
        dto::TimeEntryDto,
        dto::TimeEntryListDto,
        dto::RejectReq,
        dto::WeekDayDto,
        dto::WeeklyBucketDto,
        dto::PeriodSummaryDto,
        dto::NotificationDto,
        dto::NotificationListDto,
        dto::UnreadCountDto,
        dto::ResyncDto,
        dto::MarkAllReadDto,
        dto::SendNoticeReq,
        dto::TickReportDto,
        problem::Problem,
    )),
    modifiers(&CallerHeaders),
    tags(
        (name = "time-entries", description = "Recording, approval and accounting of time entries"),
        (name = "notifications", description = "Per-user inbox and live push"),
        (name = "reconcile", description = "Notification reconciliation"),
    )
)]
pub struct ApiDoc;

struct CallerHeaders;

impl Modify for CallerHeaders {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        for header in [USER_ID_HEADER, TENANT_ID_HEADER, USER_ROLE_HEADER] {
            components.add_security_scheme(
                header,
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(header))),
            );
        }
    }
}
