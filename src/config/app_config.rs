use crate::cache::token_store::ValkeyTokenStore;
use crate::service::token_service::{TokenConfig, TokenService};
use crate::storage::object_storage::{ObjectStorage, StorageConfig};
use bb8_redis::bb8::Pool;
use bb8_redis::RedisConnectionManager;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::sync::Arc;

/// Initializes the application state by creating and loading the PostgreSQL and
/// Redis connection pools, the token service, and the object storage adapter.
///
/// # Returns
/// An `Arc<AppState>` containing the initialized connection pools and services.
///
/// # Panics
/// This function will panic if the `DATABASE_URL`, `REDIS_URL`, or `JWT_SECRET`
/// environment variables are not set, or if it fails to create the database
/// connection pool or Redis connection manager.
pub async fn initialize_app_state() -> Arc<AppState> {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let redis_url = env::var("REDIS_URL").expect("Error getting redis host");

    // Setup connection pool.
    let pg_pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&database_url)
        .await
        .map_err(|e| {
            panic!("Failed to create database connection pool: {}", e);
        })
        .unwrap();

    // Setup Redis connection.
    let manager =
        RedisConnectionManager::new(redis_url).expect("Failed to create Redis connection manager");
    let redis_pool = Pool::builder().min_idle(5).build(manager).await.unwrap();

    let token_service = TokenService::new(
        ValkeyTokenStore::new(redis_pool.clone()),
        token_config_from_env(),
    );
    let storage = ObjectStorage::from_env(storage_config_from_env()).await;

    Arc::new(AppState {
        pg_pool,
        redis_pool,
        token_service,
        storage,
    })
}

/// Reads the JWT signing configuration from environment variables.
///
/// # Panics
/// This function will panic if `JWT_SECRET` is not set, or if an expiration
/// value is present but not a number.
pub fn token_config_from_env() -> TokenConfig {
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let jwt_issuer = env::var("JWT_TOKEN_ISSUER").unwrap_or_else(|_| "talktrack".to_string());
    let access_expiration_secs = env::var("JWT_ACCESS_EXPIRATION")
        .unwrap_or_else(|_| "1800".to_string())
        .parse::<u64>()
        .expect("Error parsing JWT access token expiration");
    let refresh_expiration_secs = env::var("JWT_REFRESH_EXPIRATION")
        .unwrap_or_else(|_| (60 * 60 * 24 * 14).to_string())
        .parse::<u64>()
        .expect("Error parsing JWT refresh token expiration");

    TokenConfig {
        jwt_secret,
        jwt_issuer,
        access_expiration_secs,
        refresh_expiration_secs,
    }
}

/// Reads the object storage configuration from environment variables.
///
/// Directory names are explicit configuration, not process-wide constants, so
/// deployments can point uploads at different prefixes.
pub fn storage_config_from_env() -> StorageConfig {
    let bucket = env::var("STORAGE_BUCKET").expect("STORAGE_BUCKET must be set");
    let region = env::var("STORAGE_REGION").unwrap_or_else(|_| "ap-northeast-2".to_string());
    let record_dir = env::var("STORAGE_RECORD_DIR").unwrap_or_else(|_| "record".to_string());
    let compare_dir = env::var("STORAGE_COMPARE_DIR").unwrap_or_else(|_| "compare".to_string());

    StorageConfig {
        bucket,
        region,
        record_dir,
        compare_dir,
    }
}

/// Retrieves the server address from the environment variables.
///
/// # Returns
/// A `String` containing the server address in the format `host:port`.
///
/// # Panics
/// This function will panic if the `SERVER_HOST` or `SERVER_PORT` environment variables are not set.
pub async fn get_server_address() -> String {
    let server_host = env::var("SERVER_HOST").expect("Error getting server host");
    let server_port = env::var("SERVER_PORT").expect("Error getting server port");
    server_host + ":" + &*server_port
}

pub struct AppState {
    pub pg_pool: PgPool,
    pub redis_pool: Pool<RedisConnectionManager>,
    pub token_service: TokenService<ValkeyTokenStore>,
    pub storage: ObjectStorage,
}
