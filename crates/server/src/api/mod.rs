use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use scanner::StartError;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        ContinuousScanRequest, ContinuousScanStarted, InstantGrabRequest, InstantGrabStarted,
        StatusResponse, StopResponse, TimesResponse,
    },
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::warn;

use crate::app_state::AppState;

const MAX_REQUEST_BYTES: usize = 16 * 1024;

type ApiFailure = (StatusCode, Json<ApiError>);

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/status", get(status))
        .route("/api/instant-grab", post(instant_grab))
        .route("/api/continuous-scan", post(continuous_scan))
        .route("/api/stop", post(stop))
        .route("/api/times", get(times))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.runs.status())
}

async fn instant_grab(
    State(state): State<AppState>,
    body: Result<Json<InstantGrabRequest>, JsonRejection>,
) -> Result<Json<InstantGrabStarted>, ApiFailure> {
    let Json(req) = body.map_err(bad_body)?;
    state
        .runs
        .start_instant_grab(req)
        .map(Json)
        .map_err(start_failure)
}

async fn continuous_scan(
    State(state): State<AppState>,
    body: Result<Json<ContinuousScanRequest>, JsonRejection>,
) -> Result<Json<ContinuousScanStarted>, ApiFailure> {
    let Json(req) = body.map_err(bad_body)?;
    state
        .runs
        .start_continuous_scan(req)
        .map(Json)
        .map_err(start_failure)
}

async fn stop(State(state): State<AppState>) -> Json<StopResponse> {
    Json(state.runs.stop())
}

async fn times(State(state): State<AppState>) -> Json<TimesResponse> {
    Json(state.runs.times())
}

fn start_failure(err: StartError) -> ApiFailure {
    let status = match err {
        StartError::Validation(_) => StatusCode::BAD_REQUEST,
        StartError::AlreadyRunning => StatusCode::CONFLICT,
    };
    warn!(%status, %err, "start request refused");
    (status, Json(ApiError::from(err)))
}

fn bad_body(rejection: JsonRejection) -> ApiFailure {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new(ErrorCode::Validation, rejection.body_text())),
    )
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
