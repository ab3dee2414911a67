use crate::infra::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use ngo_recruit::error::AppError;
use ngo_recruit::workflows::recruitment::{
    recruitment_router, ApplicationId, ApplicationStatusView, NotificationPublisher,
    RecruitmentRepository, RecruitmentService, SweepReport,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Manual override applied by a reviewer outside the automatic ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DecisionKind {
    Review,
    Select,
    Reject,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    pub(crate) decision: DecisionKind,
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

pub(crate) fn with_recruitment_routes<R, N>(service: Arc<RecruitmentService<R, N>>) -> Router
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let admin = Router::new()
        .route(
            "/api/v1/applications/:application_id/decision",
            post(decision_endpoint::<R, N>),
        )
        .route("/api/v1/admin/sweep", post(sweep_endpoint::<R, N>))
        .with_state(service.clone());

    recruitment_router(service)
        .merge(admin)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn decision_endpoint<R, N>(
    State(service): State<Arc<RecruitmentService<R, N>>>,
    Path(application_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<ApplicationStatusView>, AppError>
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = ApplicationId(application_id);
    let record = match request.decision {
        DecisionKind::Review => service.review(&id)?,
        DecisionKind::Select => service.select(&id)?,
        DecisionKind::Reject => service.reject(&id, request.reason)?,
    };
    Ok(Json(record.status_view()))
}

pub(crate) async fn sweep_endpoint<R, N>(
    State(service): State<Arc<RecruitmentService<R, N>>>,
) -> Result<Json<SweepReport>, AppError>
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Ok(Json(service.sweep_deadlines()?))
}
