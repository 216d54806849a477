use crate::api::model::common::Message;
use crate::api::model::training::SentenceResponse;
use crate::config::app_config::AppState;
use crate::error::error_model::{ApiError, AppError};
use crate::middleware::auth::AuthContext;
use crate::service::training_service;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Router};
use std::sync::Arc;

pub fn training_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{training_id}/start", get(start_training_handler))
        .route("/end", post(end_training_handler))
}

/// Start a training session
///
/// Picks a random practice sentence for the training set and caches the
/// active session for the caller.
#[utoipa::path(
    get,
    path = "/training/{training_id}/start",
    params(("training_id" = i64, Path, description = "Training set ID")),
    tag = "Training",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Practice sentence", body = SentenceResponse),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 404, description = "No sentences in the training set", body = ApiError),
        (status = 500, description = "Session could not be cached", body = ApiError),
    )
)]
pub async fn start_training_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(training_id): Path<i64>,
) -> Result<Response, AppError> {
    training_service::start_training(state, &auth.email, training_id).await
}

/// End the active training session
///
/// Clears the cached session and records a practice-activity event for today.
#[utoipa::path(
    post,
    path = "/training/end",
    tag = "Training",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Session closed", body = Message),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn end_training_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response, AppError> {
    training_service::end_training(state, &auth.email).await
}
