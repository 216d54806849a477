use async_trait::async_trait;
use bb8_redis::bb8::Pool;
use bb8_redis::redis::AsyncCommands;
use bb8_redis::RedisConnectionManager;
use derive_more::Display;

const REFRESH_TOKEN_PREFIX: &str = "refresh:token:";
const REFRESH_OWNER_PREFIX: &str = "refresh:owner:";
const BLACKLIST_PREFIX: &str = "blacklist:";

#[derive(Debug, Display, derive_more::Error)]
#[display("Token store error: {message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Persistence contract for refresh tokens and the revocation blacklist.
///
/// A refresh token is stored twice: once keyed by the raw token value (used for
/// the atomic single-use claim during reissue) and once as an owner pointer
/// keyed by email (enforces at most one active token per identity). Both
/// entries carry the refresh-token TTL so records and blacklist membership
/// expire with the credential itself.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Stores `token` as the single active refresh token for `email`,
    /// superseding any previous record for that identity.
    async fn save(&self, email: &str, token: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// Returns the active refresh token recorded for `email`, if any.
    async fn current_for(&self, email: &str) -> Result<Option<String>, StoreError>;

    /// Atomically consumes the record for `token` and returns the owner email.
    ///
    /// At most one concurrent caller can claim a given token; all others see
    /// `None`. This is the compare-and-delete step of the reissue flow.
    async fn claim(&self, token: &str) -> Result<Option<String>, StoreError>;

    /// Removes the record for `email`, returning the token it held.
    async fn delete(&self, email: &str) -> Result<Option<String>, StoreError>;

    async fn add_to_blacklist(&self, token: &str, ttl_secs: u64) -> Result<(), StoreError>;

    async fn in_blacklist(&self, token: &str) -> Result<bool, StoreError>;
}

/// Redis (Valkey) backed token store over the shared bb8 connection pool.
pub struct ValkeyTokenStore {
    pool: Pool<RedisConnectionManager>,
}

impl ValkeyTokenStore {
    pub fn new(pool: Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }

    async fn connection(
        &self,
    ) -> Result<bb8_redis::bb8::PooledConnection<'_, RedisConnectionManager>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::new(format!("Cache error: {}", e)))
    }
}

#[async_trait]
impl TokenStore for ValkeyTokenStore {
    async fn save(&self, email: &str, token: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let mut redis_con = self.connection().await?;

        // Supersede any previous record for this identity.
        let previous: Option<String> = redis_con
            .get(format!("{}{}", REFRESH_OWNER_PREFIX, email))
            .await
            .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;
        if let Some(previous) = previous {
            let _: () = redis_con
                .del(format!("{}{}", REFRESH_TOKEN_PREFIX, previous))
                .await
                .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;
        }

        let _: () = redis_con
            .set_ex(format!("{}{}", REFRESH_TOKEN_PREFIX, token), email, ttl_secs)
            .await
            .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;
        let _: () = redis_con
            .set_ex(format!("{}{}", REFRESH_OWNER_PREFIX, email), token, ttl_secs)
            .await
            .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;
        Ok(())
    }

    async fn current_for(&self, email: &str) -> Result<Option<String>, StoreError> {
        let mut redis_con = self.connection().await?;
        redis_con
            .get(format!("{}{}", REFRESH_OWNER_PREFIX, email))
            .await
            .map_err(|e| StoreError::new(format!("Redis error: {}", e)))
    }

    async fn claim(&self, token: &str) -> Result<Option<String>, StoreError> {
        let mut redis_con = self.connection().await?;

        // GETDEL is the atomic step: concurrent reissue attempts race on this
        // single command and only the winner receives the owner email.
        let owner: Option<String> = redis_con
            .get_del(format!("{}{}", REFRESH_TOKEN_PREFIX, token))
            .await
            .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;

        if let Some(ref owner) = owner {
            // Drop the owner pointer only if it still points at this token.
            let pointed: Option<String> = redis_con
                .get(format!("{}{}", REFRESH_OWNER_PREFIX, owner))
                .await
                .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;
            if pointed.as_deref() == Some(token) {
                let _: () = redis_con
                    .del(format!("{}{}", REFRESH_OWNER_PREFIX, owner))
                    .await
                    .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;
            }
        }
        Ok(owner)
    }

    async fn delete(&self, email: &str) -> Result<Option<String>, StoreError> {
        let mut redis_con = self.connection().await?;
        let token: Option<String> = redis_con
            .get_del(format!("{}{}", REFRESH_OWNER_PREFIX, email))
            .await
            .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;
        if let Some(ref token) = token {
            let _: () = redis_con
                .del(format!("{}{}", REFRESH_TOKEN_PREFIX, token))
                .await
                .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;
        }
        Ok(token)
    }

    async fn add_to_blacklist(&self, token: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let mut redis_con = self.connection().await?;
        // SET is idempotent, re-blacklisting the same token is a no-op.
        let _: () = redis_con
            .set_ex(format!("{}{}", BLACKLIST_PREFIX, token), 1u8, ttl_secs)
            .await
            .map_err(|e| StoreError::new(format!("Redis error: {}", e)))?;
        Ok(())
    }

    async fn in_blacklist(&self, token: &str) -> Result<bool, StoreError> {
        let mut redis_con = self.connection().await?;
        redis_con
            .exists(format!("{}{}", BLACKLIST_PREFIX, token))
            .await
            .map_err(|e| StoreError::new(format!("Redis error: {}", e)))
    }
}
