use axum::{
    body::Body,
    extract::Request,
    http::HeaderName,
    middleware::{from_fn, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::field::Empty;

use time_approvals::TimeApprovals;

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        Some(RequestId::new(id.parse().ok()?))
    }
}

/// Record the request id in the current span
async fn record_request_id(req: Request, next: Next) -> Response {
    let rid = req
        .headers()
        .get(request_id_header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
        .to_owned();
    tracing::Span::current().record("request_id", tracing::field::display(&rid));
    next.run(req).await
}

#[allow(clippy::type_complexity)]
fn trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl Fn(&axum::http::Request<Body>) -> tracing::Span + Clone,
> {
    TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri().path(),
            version = ?req.version(),
            request_id = Empty,
            status = Empty,
            latency_ms = Empty
        )
    })
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn openapi_json() -> impl IntoResponse {
    Json(TimeApprovals::openapi())
}

/// Full application router: module routes plus health and API docs.
///
/// Middleware order, outermost first: propagate id, set id, trace, record id, body limit.
pub fn build_router(module: &TimeApprovals) -> anyhow::Result<Router> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/openapi.json", get(openapi_json));
    let router = module.register_rest(router)?;

    let x_request_id = request_id_header();
    Ok(router
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(from_fn(record_request_id))
        .layer(trace_layer())
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeReqId))
        .layer(PropagateRequestIdLayer::new(x_request_id)))
}
