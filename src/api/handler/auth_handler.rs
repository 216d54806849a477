use crate::api::model::auth::{InvalidationResponse, LogoutRequest, RefreshRequest, TokenResponse};
use crate::config::app_config::AppState;
use crate::error::error_model::{ApiError, AppError, ErrorType};
use crate::middleware::auth::AuthContext;
use crate::service::token_service::ReissueOutcome;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json, Router};
use std::sync::Arc;
use validator::Validate;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/refresh", post(refresh_handler))
        .route("/logout", post(logout_handler))
}

/// Routes that require a valid access token; nested behind the auth
/// middleware in `main`.
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/logout-all", post(logout_all_handler))
}

/// Reissue the token pair
///
/// Exchange a valid refresh token for a new access/refresh pair. The old
/// refresh token is single-use: it is consumed by a successful exchange.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "New token pair issued", body = TokenResponse),
        (status = 401, description = "Refresh token rejected", body = ApiError),
        (status = 422, description = "Unprocessable request", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(refresh_request): Json<RefreshRequest>,
) -> Result<Response, AppError> {
    if let Err(e) = refresh_request.validate() {
        return Err(AppError::new(
            ErrorType::RequestValidationError {
                validation_error: e,
                object: "RefreshRequest".to_string(),
            },
            "Validation error. Check the refresh token value.",
        ));
    }

    match state
        .token_service
        .reissue(&refresh_request.refresh_token)
        .await?
    {
        ReissueOutcome::Issued(pair) => Ok((
            StatusCode::OK,
            Json(TokenResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
                token_type: "Bearer".to_string(),
                expires_in: state.token_service.access_expiration_secs() as i64,
            }),
        )
            .into_response()),
        // Each rejection reason surfaces as its own message so clients can
        // tell a revoked session from an expired one.
        ReissueOutcome::Rejected(rejection) => Err(AppError::new(
            ErrorType::UnauthorizedError,
            rejection.to_string(),
        )),
    }
}

/// Log out of the current session
///
/// Blacklist the presented refresh token and drop its stored record.
#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = LogoutRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Session revoked"),
        (status = 422, description = "Unprocessable request", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Json(logout_request): Json<LogoutRequest>,
) -> Result<Response, AppError> {
    if let Err(e) = logout_request.validate() {
        return Err(AppError::new(
            ErrorType::RequestValidationError {
                validation_error: e,
                object: "LogoutRequest".to_string(),
            },
            "Validation error. Check the request body.",
        ));
    }

    state
        .token_service
        .revoke_refresh_token(&logout_request.refresh_token)
        .await?;
    Ok((StatusCode::OK, "Logout successful").into_response())
}

/// Log out everywhere
///
/// Blacklist and delete every refresh token owned by the authenticated user.
/// Partial failures are reported per token, not rolled back.
#[utoipa::path(
    post,
    path = "/auth/logout-all",
    tag = "Auth",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "All sessions revoked", body = InvalidationResponse),
        (status = 401, description = "Missing or invalid access token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn logout_all_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response, AppError> {
    let report = state
        .token_service
        .invalidate_all_user_tokens(&auth.email)
        .await?;

    Ok((
        StatusCode::OK,
        Json(InvalidationResponse {
            invalidated: report.invalidated,
            failures: report.failures,
        }),
    )
        .into_response())
}
