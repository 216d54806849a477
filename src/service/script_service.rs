use crate::api::model::common::PaginationQuery;
use crate::api::model::script::{
    AnalysisResultList, AnalysisResultResponse, RecordingSubmitted, ScriptList, ScriptListItem,
    ScriptRequest, ScriptResponse,
};
use crate::config::app_config::AppState;
use crate::db::entity::script::AnalysisStatus;
use crate::db::entity::user::Users;
use crate::db::repo::{script_repository, users_repository};
use crate::error::error_model::{AppError, ErrorType};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;
use validator::Validate;

/// Resolves the authenticated user from the email carried by the access token.
async fn current_user(state: &Arc<AppState>, email: &str) -> Result<Users, AppError> {
    users_repository::get_user_by_email(&state.pg_pool, email)
        .await
        .map_err(|e| {
            error!("Error resolving authenticated user: {}", e);
            AppError::new(ErrorType::UnauthorizedError, "Unknown user.")
        })
}

/// Loads a script and enforces that `user` owns it.
async fn owned_script(
    state: &Arc<AppState>,
    user: &Users,
    script_id: i64,
) -> Result<crate::db::entity::script::Script, AppError> {
    let script = script_repository::get_script_by_id(&state.pg_pool, script_id)
        .await
        .map_err(|_| {
            AppError::new(
                ErrorType::NotFound,
                format!("Script not found for ID: {}", script_id),
            )
        })?;
    if script.user_id != user.id {
        return Err(AppError::new(
            ErrorType::Forbidden,
            "Script belongs to another user.",
        ));
    }
    Ok(script)
}

/// Spool location for an uploaded recording. Client file names are untrusted:
/// only the final path component is kept, and a UUID segment keeps concurrent
/// submissions of the same name from sharing a path.
fn temp_recording_path(user_key: &str, file_name: &str) -> PathBuf {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("recording");
    std::env::temp_dir().join(format!("talktrack-{}-{}-{}", user_key, Uuid::new_v4(), base))
}

/// Create a script for the authenticated user.
#[tracing::instrument(
    skip(state, script_request),
    fields(
        service.name = "script_service",
        service.operation = "upload_script"
    )
)]
pub async fn upload_script(
    state: Arc<AppState>,
    email: &str,
    script_request: ScriptRequest,
) -> Result<Response, AppError> {
    if let Err(e) = script_request.validate() {
        return Err(AppError::new(
            ErrorType::RequestValidationError {
                validation_error: e,
                object: "ScriptRequest".to_string(),
            },
            "Validation error. Check the request body.",
        ));
    }
    let user = current_user(&state, email).await?;

    let script_id = script_repository::create_script(
        &state.pg_pool,
        user.id,
        &script_request.title,
        &script_request.content,
        script_request.accent.as_deref(),
    )
    .await
    .map_err(|e| {
        error!("Error creating script: {:?}", e);
        AppError::new(ErrorType::InternalServerError, "Error creating script.")
    })?;

    let script = script_repository::get_script_by_id(&state.pg_pool, script_id)
        .await
        .map_err(|e| {
            error!("Error reading back created script: {:?}", e);
            AppError::new(ErrorType::InternalServerError, "Error creating script.")
        })?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/scripts/{}", script_id))],
        Json(ScriptResponse::from(script)),
    )
        .into_response())
}

/// Paginated list of the authenticated user's scripts.
pub async fn get_script_list(
    state: Arc<AppState>,
    email: &str,
    pagination: PaginationQuery,
) -> Result<Response, AppError> {
    let user = current_user(&state, email).await?;
    let page = pagination.page.max(1);
    let limit = pagination.size.clamp(1, 100);

    let scripts = script_repository::get_scripts_by_user(&state.pg_pool, user.id, limit, page)
        .await
        .map_err(|e| {
            error!("Error listing scripts: {:?}", e);
            AppError::new(ErrorType::InternalServerError, "Error listing scripts.")
        })?;
    let total = script_repository::count_scripts_by_user(&state.pg_pool, user.id)
        .await
        .unwrap_or(0);

    Ok((
        StatusCode::OK,
        Json(ScriptList {
            scripts: scripts.into_iter().map(ScriptListItem::from).collect(),
            current_page: page,
            total_items: total,
            total_pages: (total as f64 / limit as f64).ceil() as i64,
            items_per_page: limit,
        }),
    )
        .into_response())
}

/// Single script, owner only.
pub async fn get_script(
    state: Arc<AppState>,
    email: &str,
    script_id: i64,
) -> Result<Response, AppError> {
    let user = current_user(&state, email).await?;
    let script = owned_script(&state, &user, script_id).await?;
    Ok((StatusCode::OK, Json(ScriptResponse::from(script))).into_response())
}

/// Owning user id of a script, for cross-service ownership checks.
pub async fn get_script_writer(state: &Arc<AppState>, script_id: i64) -> Result<i64, AppError> {
    script_repository::get_script_writer(&state.pg_pool, script_id)
        .await
        .map_err(|_| {
            AppError::new(
                ErrorType::NotFound,
                format!("Script not found for ID: {}", script_id),
            )
        })
}

pub async fn delete_script(
    state: Arc<AppState>,
    email: &str,
    script_id: i64,
) -> Result<Response, AppError> {
    let user = current_user(&state, email).await?;
    let writer = get_script_writer(&state, script_id).await?;
    if writer != user.id {
        return Err(AppError::new(
            ErrorType::Forbidden,
            "Script belongs to another user.",
        ));
    }

    script_repository::delete_script(&state.pg_pool, script_id)
        .await
        .map_err(|e| {
            error!("Error deleting script: {:?}", e);
            AppError::new(ErrorType::InternalServerError, "Error deleting script.")
        })?;
    Ok((StatusCode::NO_CONTENT,).into_response())
}

/// Uploads a voice recording for a script and records a pending analysis row.
///
/// The multipart payload is spooled to a local temp file first, mirroring the
/// storage adapter's temp-file contract; the adapter removes the file after
/// the upload.
#[tracing::instrument(
    skip(state, bytes),
    fields(
        service.name = "script_service",
        service.operation = "submit_recording"
    )
)]
pub async fn submit_recording(
    state: Arc<AppState>,
    email: &str,
    script_id: i64,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<Response, AppError> {
    let user = current_user(&state, email).await?;
    owned_script(&state, &user, script_id).await?;

    if bytes.is_empty() {
        return Err(AppError::new(
            ErrorType::BadRequest,
            "Recording payload is empty.",
        ));
    }

    let temp_path = temp_recording_path(&user.key, file_name);
    tokio::fs::write(&temp_path, &bytes).await.map_err(|e| {
        error!("Error writing temp recording file: {}", e);
        AppError::new(ErrorType::InternalServerError, "Error storing recording.")
    })?;

    let record_url = state
        .storage
        .upload_file(
            &temp_path,
            file_name,
            content_type,
            state.storage.record_dir(),
        )
        .await
        .map_err(|e| {
            error!("Error uploading recording: {}", e);
            if e.is_transient() {
                AppError::new(
                    ErrorType::InternalServerError,
                    "Storage temporarily unavailable. Please retry the upload.",
                )
            } else {
                AppError::new(ErrorType::InternalServerError, "Failed to upload record.")
            }
        })?;

    let result_id = script_repository::create_result(
        &state.pg_pool,
        script_id,
        &record_url,
        &serde_json::json!({}),
        AnalysisStatus::Pending,
    )
    .await
    .map_err(|e| {
        error!("Error recording analysis submission: {:?}", e);
        AppError::new(ErrorType::InternalServerError, "Error storing recording.")
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(RecordingSubmitted {
            script_id,
            result_id,
            record_url,
        }),
    )
        .into_response())
}

/// Stores a completed analysis payload for a script recording. The script
/// must exist and belong to the caller, same as every other result operation.
pub async fn save_result(
    state: Arc<AppState>,
    email: &str,
    script_id: i64,
    record_url: &str,
    payload: serde_json::Value,
) -> Result<i64, AppError> {
    let user = current_user(&state, email).await?;
    owned_script(&state, &user, script_id).await?;

    script_repository::create_result(
        &state.pg_pool,
        script_id,
        record_url,
        &payload,
        AnalysisStatus::Done,
    )
    .await
    .map_err(|e| {
        error!("Error saving analysis result: {:?}", e);
        AppError::new(
            ErrorType::InternalServerError,
            "Error saving analysis result.",
        )
    })
}

/// Single analysis result; access restricted to the script owner.
pub async fn get_result(
    state: Arc<AppState>,
    email: &str,
    result_id: i64,
) -> Result<Response, AppError> {
    let user = current_user(&state, email).await?;
    let result = script_repository::get_result_by_id(&state.pg_pool, result_id)
        .await
        .map_err(|_| {
            AppError::new(
                ErrorType::NotFound,
                format!("Result not found for ID: {}", result_id),
            )
        })?;
    owned_script(&state, &user, result.script_id).await?;

    Ok((StatusCode::OK, Json(AnalysisResultResponse::from(result))).into_response())
}

/// Paginated analysis results for one script, owner only.
pub async fn get_script_result_list(
    state: Arc<AppState>,
    email: &str,
    script_id: i64,
    pagination: PaginationQuery,
) -> Result<Response, AppError> {
    let user = current_user(&state, email).await?;
    owned_script(&state, &user, script_id).await?;
    let page = pagination.page.max(1);
    let limit = pagination.size.clamp(1, 100);

    let results = script_repository::get_results_by_script(&state.pg_pool, script_id, limit, page)
        .await
        .map_err(|e| {
            error!("Error listing analysis results: {:?}", e);
            AppError::new(ErrorType::InternalServerError, "Error listing results.")
        })?;
    let total = script_repository::count_results_by_script(&state.pg_pool, script_id)
        .await
        .unwrap_or(0);

    Ok((
        StatusCode::OK,
        Json(AnalysisResultList {
            results: results
                .into_iter()
                .map(AnalysisResultResponse::from)
                .collect(),
            current_page: page,
            total_items: total,
            total_pages: (total as f64 / limit as f64).ceil() as i64,
            items_per_page: limit,
        }),
    )
        .into_response())
}

pub async fn delete_result(
    state: Arc<AppState>,
    email: &str,
    result_id: i64,
) -> Result<Response, AppError> {
    let user = current_user(&state, email).await?;
    let result = script_repository::get_result_by_id(&state.pg_pool, result_id)
        .await
        .map_err(|_| {
            AppError::new(
                ErrorType::NotFound,
                format!("Result not found for ID: {}", result_id),
            )
        })?;
    owned_script(&state, &user, result.script_id).await?;

    script_repository::delete_result(&state.pg_pool, result_id)
        .await
        .map_err(|e| {
            error!("Error deleting analysis result: {:?}", e);
            AppError::new(ErrorType::InternalServerError, "Error deleting result.")
        })?;
    Ok((StatusCode::NO_CONTENT,).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_paths_differ_for_identical_submissions() {
        let first = temp_recording_path("usr_a", "take1.wav");
        let second = temp_recording_path("usr_a", "take1.wav");
        assert_ne!(first, second);
    }

    #[test]
    fn temp_path_keeps_only_the_final_name_component() {
        let path = temp_recording_path("usr_a", "../../etc/passwd");
        assert_eq!(path.parent(), Some(std::env::temp_dir().as_path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("passwd"));
        assert!(name.starts_with("talktrack-usr_a-"));
    }

    #[test]
    fn temp_path_survives_a_directory_only_name() {
        let path = temp_recording_path("usr_a", "uploads/");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-recording"));
    }
}
