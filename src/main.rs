use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable};

use talktrack_api::api::handler::{auth_handler, script_handler, training_handler};
use talktrack_api::api::model;
use talktrack_api::config::app_config;
use talktrack_api::error::error_model;
use talktrack_api::middleware::auth::require_auth;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TalkTrack API",
        description = "Speech practice backend: scripts, voice recordings, training sessions and token lifecycle.",
        version = "0.1.0"
    ),
    paths(
        auth_handler::refresh_handler,
        auth_handler::logout_handler,
        auth_handler::logout_all_handler,
        script_handler::create_script_handler,
        script_handler::list_scripts_handler,
        script_handler::get_script_handler,
        script_handler::delete_script_handler,
        script_handler::submit_recording_handler,
        script_handler::save_result_handler,
        script_handler::list_results_handler,
        script_handler::get_result_handler,
        script_handler::delete_result_handler,
        training_handler::start_training_handler,
        training_handler::end_training_handler,
    ),
    components(schemas(
        model::auth::RefreshRequest,
        model::auth::LogoutRequest,
        model::auth::TokenResponse,
        model::auth::InvalidationResponse,
        model::common::Message,
        model::script::ScriptRequest,
        model::script::ScriptResponse,
        model::script::ScriptList,
        model::script::AnalysisResultRequest,
        model::script::AnalysisResultResponse,
        model::script::AnalysisResultList,
        model::script::RecordingSubmitted,
        model::training::SentenceResponse,
        error_model::ApiError,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Refresh token lifecycle"),
        (name = "Scripts", description = "Script and analysis result management"),
        (name = "Training", description = "Practice sessions and activity tracking"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() {
    // Logging handler using tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();

    let state = app_config::initialize_app_state().await;

    // Everything except token issuance sits behind the access-token check.
    let protected_routes = Router::new()
        .nest("/auth", auth_handler::session_routes())
        .nest("/scripts", script_handler::script_routes())
        .nest("/training", training_handler::training_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .nest("/auth", auth_handler::auth_routes())
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state);

    let server_addr = app_config::get_server_address().await;
    let server_address: SocketAddr = server_addr.parse().unwrap();
    info!("Starting server at {}", server_addr);
    let listener = tokio::net::TcpListener::bind(server_address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
