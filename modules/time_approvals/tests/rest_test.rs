mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use time_approvals::{
    api::rest::{
        auth::{TENANT_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER},
        dto::{NotificationListDto, TickReportDto, TimeEntryDto, UnreadCountDto},
        routes,
    },
    contract::model::Principal,
};

use common::TestEnv;

async fn create_test_router() -> (TestEnv, Router) {
    let env = TestEnv::new().await;
    let router =
        routes::register_routes(Router::new(), &env.services).expect("Failed to register routes");
    (env, router)
}

fn request(method: Method, uri: &str, who: Option<&Principal>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(p) = who {
        builder = builder
            .header(USER_ID_HEADER, p.user_id.to_string())
            .header(TENANT_ID_HEADER, p.tenant_id.to_string())
            .header(USER_ROLE_HEADER, p.role.as_str());
    }
    match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn entry_body(date: &str) -> Value {
    json!({
        "date": date,
        "shift1": { "entry": "08:00", "exit": "12:00" },
        "shift2": { "entry": "13:00", "exit": "18:00" }
    })
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let (_env, router) = create_test_router().await;

    let response = router
        .oneshot(request(Method::GET, "/time-entries", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
    let problem = json_body(response).await;
    assert_eq!(problem["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn create_approve_and_read_back() -> Result<()> {
    let (env, router) = create_test_router().await;

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/time-entries",
            Some(&env.employee),
            Some(entry_body("2024-01-10")),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: TimeEntryDto = serde_json::from_value(json_body(response).await)?;
    assert_eq!(created.status, "pending");
    assert_eq!(created.summary.worked_minutes, 540);
    assert_eq!(created.summary.overtime_minutes, 60);
    assert_eq!(created.summary.worked, "09:00");

    // Same day again
    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/time-entries",
            Some(&env.employee),
            Some(entry_body("2024-01-10")),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "TIME_ENTRY_DUPLICATE");

    // Employees may not approve
    let approve_uri = format!("/time-entries/{}/approve", created.id);
    let response = router
        .clone()
        .oneshot(request(Method::POST, &approve_uri, Some(&env.employee), None))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .clone()
        .oneshot(request(Method::POST, &approve_uri, Some(&env.admin_a), None))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let approved: TimeEntryDto = serde_json::from_value(json_body(response).await)?;
    assert_eq!(approved.status, "approved");

    // Approving twice is a conflict
    let response = router
        .clone()
        .oneshot(request(Method::POST, &approve_uri, Some(&env.admin_b), None))
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let problem = json_body(response).await;
    assert_eq!(problem["code"], "TIME_ENTRY_INVALID_TRANSITION");
    assert_eq!(problem["instance"], approve_uri);

    let response = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/notifications?unread_only=true",
            Some(&env.employee),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let inbox: NotificationListDto = serde_json::from_value(json_body(response).await)?;
    assert_eq!(inbox.items.len(), 1);
    assert_eq!(inbox.items[0].kind, "approved");
    assert_eq!(inbox.items[0].related_entry_id, Some(created.id));

    let read_uri = format!("/notifications/{}/read", inbox.items[0].id);
    let response = router
        .clone()
        .oneshot(request(Method::POST, &read_uri, Some(&env.employee), None))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(request(
            Method::GET,
            "/notifications/unread-count",
            Some(&env.employee),
            None,
        ))
        .await?;
    let count: UnreadCountDto = serde_json::from_value(json_body(response).await)?;
    assert_eq!(count.unread, 0);
    Ok(())
}

#[tokio::test]
async fn reject_accepts_an_empty_body() -> Result<()> {
    let (env, router) = create_test_router().await;
    let entry = env
        .services
        .approvals
        .create_entry(&env.employee, common::full_day(common::day(2024, 1, 10)))
        .await?;

    let response = router
        .oneshot(request(
            Method::POST,
            &format!("/time-entries/{}/reject", entry.id),
            Some(&env.admin_a),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "rejected");
    Ok(())
}

#[tokio::test]
async fn validation_errors_are_bad_requests() -> Result<()> {
    let (env, router) = create_test_router().await;

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/time-entries",
            Some(&env.employee),
            Some(json!({ "date": "2024-01-10", "shift1": { "exit": "12:00" } })),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "TIME_VALIDATION");

    let response = router
        .oneshot(request(
            Method::GET,
            "/time-entries/summary/period?from=2024-02-01&to=2024-01-01",
            Some(&env.employee),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn summaries_over_http() -> Result<()> {
    let (env, router) = create_test_router().await;
    env.services
        .approvals
        .create_entry(&env.employee, common::full_day(common::day(2024, 1, 8)))
        .await?;

    let response = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/time-entries/summary/week?today=2024-01-10",
            Some(&env.employee),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let week = json_body(response).await;
    assert_eq!(week["week_start"], "2024-01-08");
    assert_eq!(week["total"], "09:00");
    assert_eq!(week["days"].as_array().map(Vec::len), Some(7));

    let response = router
        .oneshot(request(
            Method::GET,
            "/time-entries/summary/period?from=2024-01-08&to=2024-01-08",
            Some(&env.employee),
            None,
        ))
        .await?;
    let period = json_body(response).await;
    assert_eq!(period["balance"], "+01:00");
    Ok(())
}

#[tokio::test]
async fn notices_and_manual_reconcile() -> Result<()> {
    let (env, router) = create_test_router().await;
    env.services
        .approvals
        .create_entry(&env.employee, common::full_day(common::day(2024, 1, 10)))
        .await?;

    let response = router
        .clone()
        .oneshot(request(Method::POST, "/reconcile", Some(&env.employee), None))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .clone()
        .oneshot(request(Method::POST, "/reconcile", Some(&env.admin_a), None))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let report: TickReportDto = serde_json::from_value(json_body(response).await)?;
    assert_eq!(report.created, 2);
    assert!(report.failed.is_empty());

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/notifications/notices",
            Some(&env.admin_a),
            Some(json!({
                "recipient_id": env.employee.user_id,
                "kind": "reminder",
                "note": "Please record Friday"
            })),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let notice = json_body(response).await;
    assert_eq!(notice["kind"], "reminder");
    assert_eq!(notice["metadata"]["note"], "Please record Friday");

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/notifications/notices",
            Some(&env.admin_a),
            Some(json!({
                "recipient_id": env.employee.user_id,
                "kind": "pending_approval",
                "note": "forged"
            })),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/notifications/read-all",
            Some(&env.admin_b),
            None,
        ))
        .await?;
    assert_eq!(json_body(response).await["updated"], 1);

    let response = router
        .oneshot(request(
            Method::DELETE,
            &format!("/notifications/{}", notice["id"].as_str().unwrap()),
            Some(&env.admin_a),
            None,
        ))
        .await?;
    // Only the recipient may delete
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn events_endpoint_streams_sse() -> Result<()> {
    let (env, router) = create_test_router().await;

    let response = router
        .oneshot(request(
            Method::GET,
            "/notifications/events",
            Some(&env.employee),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    Ok(())
}
