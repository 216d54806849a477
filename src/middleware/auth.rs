use crate::config::app_config::AppState;
use crate::error::error_model::{AppError, ErrorType};
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::debug;

/// Context inserted into request extensions after successful auth.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_key: String,
    pub email: String,
}

/// Middleware function that enforces Bearer JWT authentication.
///
/// Access tokens are stateless: signature, issuer and expiry are checked
/// locally, with no cache round trip. Revocation only applies to refresh
/// tokens, so a stolen access token stays usable until it expires.
///
/// On success an [`AuthContext`] is inserted into the request extensions for
/// downstream handlers.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let unauthorized = |msg: &str| -> Response {
        AppError::new(ErrorType::UnauthorizedError, msg).into_response()
    };

    let auth_header_val = match req.headers().get(header::AUTHORIZATION) {
        Some(v) => match v.to_str() {
            Ok(s) => s,
            Err(_) => return unauthorized("Invalid Authorization header"),
        },
        None => return unauthorized("Missing Authorization header"),
    };

    let token = match auth_header_val.strip_prefix("Bearer ") {
        Some(t) if !t.is_empty() => t,
        _ => return unauthorized("Authorization header must be Bearer token"),
    };

    let claims = match state.token_service.validate_access_token(token) {
        Ok(claims) => claims,
        Err(rejection) => {
            debug!("Access token rejected: {}", rejection);
            return unauthorized("Invalid or expired access token");
        }
    };

    req.extensions_mut().insert(AuthContext {
        user_key: claims.sub,
        email: claims.email,
    });

    next.run(req).await
}
