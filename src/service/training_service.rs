use crate::api::model::common::Message;
use crate::api::model::training::{SentenceResponse, TrainingSession};
use crate::cache::valkey_cache;
use crate::config::app_config::AppState;
use crate::db::entity::user::Users;
use crate::db::repo::{grass_repository, training_repository, users_repository};
use crate::error::error_model::{AppError, ErrorType};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// Abandoned sessions fall out of the cache on their own.
const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

fn session_key(user: &Users) -> String {
    format!("training:session:{}", user.key)
}

async fn current_user(state: &Arc<AppState>, email: &str) -> Result<Users, AppError> {
    users_repository::get_user_by_email(&state.pg_pool, email)
        .await
        .map_err(|e| {
            error!("Error resolving authenticated user: {}", e);
            AppError::new(ErrorType::UnauthorizedError, "Unknown user.")
        })
}

/// Starts a practice run: picks a random sentence from the training set and
/// caches the session against the user.
#[tracing::instrument(
    skip(state),
    fields(
        service.name = "training_service",
        service.operation = "start_training"
    )
)]
pub async fn start_training(
    state: Arc<AppState>,
    email: &str,
    training_id: i64,
) -> Result<Response, AppError> {
    let user = current_user(&state, email).await?;

    let sentence = training_repository::get_random_sentence(&state.pg_pool, training_id)
        .await
        .map_err(|e| {
            error!("Error fetching practice sentence: {:?}", e);
            AppError::new(
                ErrorType::NotFound,
                format!("No practice sentences for training ID: {}", training_id),
            )
        })?;

    valkey_cache::set_object_with_ttl(
        State(state.clone()),
        &session_key(&user),
        &TrainingSession {
            training_id,
            sentence_id: sentence.id,
        },
        SESSION_TTL.as_secs(),
    )
    .await
    .map_err(|e| {
        error!("Error caching training session: {:?}", e.error_message);
        AppError::new(ErrorType::InternalServerError, "Failed to upload record.")
    })?;

    Ok((
        StatusCode::OK,
        Json(SentenceResponse {
            training_id,
            sentence: sentence.sentence,
        }),
    )
        .into_response())
}

/// Ends the practice run: clears the cached session and records today's
/// practice-activity event.
#[tracing::instrument(
    skip(state),
    fields(
        service.name = "training_service",
        service.operation = "end_training"
    )
)]
pub async fn end_training(state: Arc<AppState>, email: &str) -> Result<Response, AppError> {
    let user = current_user(&state, email).await?;

    // Already-expired sessions still count; ending is idempotent.
    match valkey_cache::get_object::<TrainingSession>(State(state.clone()), &session_key(&user))
        .await
    {
        Ok(Some(session)) => info!("Closing training session {}", session.training_id),
        Ok(None) => info!("No active training session to close"),
        Err(e) => error!("Error reading training session: {:?}", e.error_message),
    }

    valkey_cache::delete_object(State(state.clone()), &session_key(&user))
        .await
        .map_err(|e| {
            error!("Error clearing training session: {:?}", e.error_message);
            AppError::new(
                ErrorType::InternalServerError,
                "Something went wrong. Please try again later.",
            )
        })?;

    grass_repository::add_grass_record(&state.pg_pool, user.id)
        .await
        .map_err(|e| {
            error!("Error recording practice activity: {:?}", e);
            AppError::new(
                ErrorType::InternalServerError,
                "Something went wrong. Please try again later.",
            )
        })?;

    Ok((
        StatusCode::OK,
        Json(Message {
            message: "Training session closed".to_string(),
            status: "Success".to_string(),
        }),
    )
        .into_response())
}
