use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{ApplicationForm, ApplicationId, CampaignId};
use super::repository::{NotificationPublisher, RecruitmentRepository, RepositoryError};
use super::service::{RecruitmentService, RecruitmentServiceError};

/// Router builder exposing intake, submission, evaluation, and selection endpoints.
pub fn recruitment_router<R, N>(service: Arc<RecruitmentService<R, N>>) -> Router
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/campaigns/:campaign_id/applications",
            post(create_handler::<R, N>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/close-applications",
            post(close_handler::<R, N>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/statistics",
            get(statistics_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(status_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/submit",
            post(submit_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/evaluate",
            post(evaluate_handler::<R, N>),
        )
        .with_state(service)
}

/// HTTP status for a service error. Concurrency conflicts and state-machine violations are 409.
pub fn error_status(error: &RecruitmentServiceError) -> StatusCode {
    match error {
        RecruitmentServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RecruitmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RecruitmentServiceError::Conflict(_)
        | RecruitmentServiceError::Repository(RepositoryError::Conflict)
        | RecruitmentServiceError::ApplicationTransition { .. }
        | RecruitmentServiceError::CampaignTransition { .. }
        | RecruitmentServiceError::NotEvaluable { .. } => StatusCode::CONFLICT,
        RecruitmentServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn error_response(error: RecruitmentServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
        "retryable": error.is_retryable(),
    });
    (error_status(&error), axum::Json(payload)).into_response()
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<Arc<RecruitmentService<R, N>>>,
    Path(campaign_id): Path<String>,
    axum::Json(form): axum::Json<ApplicationForm>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create_application(&CampaignId(campaign_id), form) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<RecruitmentService<R, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_handler<R, N>(
    State(service): State<Arc<RecruitmentService<R, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.evaluate(&ApplicationId(application_id)) {
        Ok(evaluation) => (StatusCode::OK, axum::Json(evaluation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<RecruitmentService<R, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn close_handler<R, N>(
    State(service): State<Arc<RecruitmentService<R, N>>>,
    Path(campaign_id): Path<String>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.close_and_select(&CampaignId(campaign_id)) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn statistics_handler<R, N>(
    State(service): State<Arc<RecruitmentService<R, N>>>,
    Path(campaign_id): Path<String>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.campaign_statistics(&CampaignId(campaign_id)) {
        Ok(statistics) => (StatusCode::OK, axum::Json(statistics)).into_response(),
        Err(error) => error_response(error),
    }
}
