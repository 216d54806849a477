use crate::api::model::common::PaginationQuery;
use crate::api::model::script::{
    AnalysisResultList, AnalysisResultRequest, AnalysisResultResponse, RecordingSubmitted,
    ScriptList, ScriptRequest, ScriptResponse,
};
use crate::config::app_config::AppState;
use crate::error::error_model::{ApiError, AppError, ErrorType};
use crate::middleware::auth::AuthContext;
use crate::service::script_service;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use std::sync::Arc;
use validator::Validate;

pub fn script_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_script_handler).get(list_scripts_handler))
        .route(
            "/{script_id}",
            get(get_script_handler).delete(delete_script_handler),
        )
        .route("/{script_id}/record", post(submit_recording_handler))
        .route(
            "/{script_id}/results",
            post(save_result_handler).get(list_results_handler),
        )
        .route(
            "/results/{result_id}",
            get(get_result_handler).delete(delete_result_handler),
        )
}

/// Create a script
#[utoipa::path(
    post,
    path = "/scripts",
    request_body = ScriptRequest,
    tag = "Scripts",
    security(("bearer_token" = [])),
    responses(
        (status = 201, description = "Script created", body = ScriptResponse),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 422, description = "Unprocessable request", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn create_script_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(script_request): Json<ScriptRequest>,
) -> Result<Response, AppError> {
    script_service::upload_script(state, &auth.email, script_request).await
}

/// List the caller's scripts
#[utoipa::path(
    get,
    path = "/scripts",
    params(PaginationQuery),
    tag = "Scripts",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Paginated script list", body = ScriptList),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn list_scripts_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Response, AppError> {
    script_service::get_script_list(state, &auth.email, pagination).await
}

/// Get a single script
#[utoipa::path(
    get,
    path = "/scripts/{script_id}",
    params(("script_id" = i64, Path, description = "Script ID")),
    tag = "Scripts",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Script detail", body = ScriptResponse),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 403, description = "Script owned by another user", body = ApiError),
        (status = 404, description = "Script not found", body = ApiError),
    )
)]
pub async fn get_script_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(script_id): Path<i64>,
) -> Result<Response, AppError> {
    script_service::get_script(state, &auth.email, script_id).await
}

/// Delete a script
#[utoipa::path(
    delete,
    path = "/scripts/{script_id}",
    params(("script_id" = i64, Path, description = "Script ID")),
    tag = "Scripts",
    security(("bearer_token" = [])),
    responses(
        (status = 204, description = "Script deleted"),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 403, description = "Script owned by another user", body = ApiError),
        (status = 404, description = "Script not found", body = ApiError),
    )
)]
pub async fn delete_script_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(script_id): Path<i64>,
) -> Result<Response, AppError> {
    script_service::delete_script(state, &auth.email, script_id).await
}

/// Submit a voice recording for analysis
///
/// Accepts a multipart form with a single `record` file part, uploads it to
/// object storage and records a pending analysis row.
#[utoipa::path(
    post,
    path = "/scripts/{script_id}/record",
    params(("script_id" = i64, Path, description = "Script ID")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    tag = "Scripts",
    security(("bearer_token" = [])),
    responses(
        (status = 202, description = "Recording accepted", body = RecordingSubmitted),
        (status = 400, description = "Missing or empty file part", body = ApiError),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 403, description = "Script owned by another user", body = ApiError),
        (status = 500, description = "Upload failed", body = ApiError),
    )
)]
pub async fn submit_recording_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(script_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::new(
            ErrorType::BadRequest,
            format!("Malformed multipart body: {}", e),
        )
    })? {
        if field.name() != Some("record") {
            continue;
        }
        let file_name = field
            .file_name()
            .unwrap_or("recording.wav")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| {
                AppError::new(
                    ErrorType::BadRequest,
                    format!("Failed to read file part: {}", e),
                )
            })?
            .to_vec();
        return script_service::submit_recording(
            state,
            &auth.email,
            script_id,
            &file_name,
            &content_type,
            bytes,
        )
        .await;
    }

    Err(AppError::new(
        ErrorType::BadRequest,
        "Multipart field 'record' is required.",
    ))
}

/// Store an analysis result
///
/// Callback surface for the analysis pipeline once scoring of a recording is
/// complete. The target script must exist and belong to the caller.
#[utoipa::path(
    post,
    path = "/scripts/{script_id}/results",
    params(("script_id" = i64, Path, description = "Script ID")),
    request_body = AnalysisResultRequest,
    tag = "Scripts",
    security(("bearer_token" = [])),
    responses(
        (status = 201, description = "Analysis result stored"),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 403, description = "Script owned by another user", body = ApiError),
        (status = 404, description = "Script not found", body = ApiError),
        (status = 422, description = "Unprocessable request", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn save_result_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(script_id): Path<i64>,
    Json(result_request): Json<AnalysisResultRequest>,
) -> Result<Response, AppError> {
    if let Err(e) = result_request.validate() {
        return Err(AppError::new(
            ErrorType::RequestValidationError {
                validation_error: e,
                object: "AnalysisResultRequest".to_string(),
            },
            "Validation error. Check the analysis result payload.",
        ));
    }

    let result_id = script_service::save_result(
        state,
        &auth.email,
        script_id,
        &result_request.record_url,
        result_request.payload,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        [("Location", format!("/scripts/results/{}", result_id))],
    )
        .into_response())
}

/// List analysis results for a script
#[utoipa::path(
    get,
    path = "/scripts/{script_id}/results",
    params(("script_id" = i64, Path, description = "Script ID"), PaginationQuery),
    tag = "Scripts",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Paginated result list", body = AnalysisResultList),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 403, description = "Script owned by another user", body = ApiError),
        (status = 404, description = "Script not found", body = ApiError),
    )
)]
pub async fn list_results_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(script_id): Path<i64>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Response, AppError> {
    script_service::get_script_result_list(state, &auth.email, script_id, pagination).await
}

/// Get a single analysis result
#[utoipa::path(
    get,
    path = "/scripts/results/{result_id}",
    params(("result_id" = i64, Path, description = "Analysis result ID")),
    tag = "Scripts",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Analysis result", body = AnalysisResultResponse),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 403, description = "Result owned by another user", body = ApiError),
        (status = 404, description = "Result not found", body = ApiError),
    )
)]
pub async fn get_result_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(result_id): Path<i64>,
) -> Result<Response, AppError> {
    script_service::get_result(state, &auth.email, result_id).await
}

/// Delete an analysis result
#[utoipa::path(
    delete,
    path = "/scripts/results/{result_id}",
    params(("result_id" = i64, Path, description = "Analysis result ID")),
    tag = "Scripts",
    security(("bearer_token" = [])),
    responses(
        (status = 204, description = "Result deleted"),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 403, description = "Result owned by another user", body = ApiError),
        (status = 404, description = "Result not found", body = ApiError),
    )
)]
pub async fn delete_result_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(result_id): Path<i64>,
) -> Result<Response, AppError> {
    script_service::delete_result(state, &auth.email, result_id).await
}
