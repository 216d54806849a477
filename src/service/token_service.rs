use crate::cache::token_store::TokenStore;
use crate::db::entity::user::Users;
use crate::error::error_model::{AppError, ErrorType};
use chrono::Utc;
use derive_more::Display;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Signing configuration for access and refresh tokens.
#[derive(Clone)]
pub struct TokenConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_expiration_secs: u64,
    pub refresh_expiration_secs: u64,
}

/// Claims carried by both token kinds. The refresh flow relies on `email` to
/// locate the persisted record for the presented token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: TokenType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Identity snapshot baked into freshly minted tokens.
#[derive(Debug, Clone)]
pub struct UserClaims {
    pub user_key: String,
    pub email: String,
}

impl From<&Users> for UserClaims {
    fn from(user: &Users) -> Self {
        UserClaims {
            user_key: user.key.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Why a reissue attempt was turned down. Callers can tell a revoked token
/// from an expired or unknown one instead of a bare null.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRejection {
    #[display("Refresh token has been revoked")]
    Blacklisted,
    #[display("Refresh token has expired")]
    Expired,
    #[display("No refresh token on record for this identity")]
    NotFound,
    #[display("Refresh token is not valid")]
    Invalid,
}

#[derive(Debug)]
pub enum ReissueOutcome {
    Issued(TokenPair),
    Rejected(RefreshRejection),
}

/// Outcome of a bulk invalidation. Each (blacklist, delete) pair is applied
/// independently; a failure on one record does not abort the rest.
#[derive(Debug, Default)]
pub struct InvalidationReport {
    pub invalidated: usize,
    pub failures: Vec<String>,
}

/// Manages the full lifecycle of access/refresh credentials: issue, validate,
/// reissue (single-use rotation), blacklist, and bulk invalidation.
pub struct TokenService<S: TokenStore> {
    store: S,
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl<S: TokenStore> TokenService<S> {
    pub fn new(store: S, config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.jwt_issuer.clone()]);
        validation.validate_exp = true;

        Self {
            store,
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Generates a short-lived access token. Pure signing, no side effects;
    /// validity is later checked by signature and expiry alone.
    pub fn generate_access_token(&self, user: &UserClaims) -> Result<String, AppError> {
        self.encode_claims(user, TokenType::Access, self.config.access_expiration_secs)
    }

    /// Generates a refresh token and persists it as the single active record
    /// for the claimed identity, superseding any previous one.
    ///
    /// Insert-or-replace applies here as well as on reissue, so a fresh login
    /// invalidates the prior session's refresh token.
    pub async fn generate_refresh_token(&self, user: &UserClaims) -> Result<String, AppError> {
        let token = self.encode_claims(
            user,
            TokenType::Refresh,
            self.config.refresh_expiration_secs,
        )?;
        self.store
            .save(&user.email, &token, self.config.refresh_expiration_secs)
            .await
            .map_err(|e| {
                error!("Error persisting refresh token: {}", e);
                AppError::new(
                    ErrorType::InternalServerError,
                    "Failed to generate refresh token.",
                )
            })?;
        Ok(token)
    }

    /// Exchanges a refresh token for a new access/refresh pair.
    ///
    /// The presented token must not be blacklisted, must carry a valid
    /// signature and expiry, and must match the persisted record for its
    /// embedded identity. The record swap is an atomic single-use claim, so of
    /// two concurrent reissue calls with the same token exactly one succeeds
    /// and the other is rejected.
    #[tracing::instrument(skip(self, refresh_token))]
    pub async fn reissue(&self, refresh_token: &str) -> Result<ReissueOutcome, AppError> {
        if self.is_refresh_token_blacklisted(refresh_token).await? {
            return Ok(ReissueOutcome::Rejected(RefreshRejection::Blacklisted));
        }

        let claims = match self.decode_token(refresh_token, TokenType::Refresh) {
            Ok(claims) => claims,
            Err(rejection) => return Ok(ReissueOutcome::Rejected(rejection)),
        };

        let stored = self
            .store
            .current_for(&claims.email)
            .await
            .map_err(|e| {
                error!("Error reading refresh token record: {}", e);
                AppError::new(
                    ErrorType::InternalServerError,
                    "Something went wrong. Please try again later.",
                )
            })?;
        match stored {
            None => return Ok(ReissueOutcome::Rejected(RefreshRejection::NotFound)),
            Some(stored) if stored != refresh_token => {
                // Superseded by a newer session or an earlier rotation.
                return Ok(ReissueOutcome::Rejected(RefreshRejection::Invalid));
            }
            Some(_) => {}
        }

        // Single-use claim. Losing the race means another caller already
        // rotated this token.
        let owner = self.store.claim(refresh_token).await.map_err(|e| {
            error!("Error claiming refresh token: {}", e);
            AppError::new(
                ErrorType::InternalServerError,
                "Something went wrong. Please try again later.",
            )
        })?;
        match owner {
            Some(owner) if owner == claims.email => {}
            _ => return Ok(ReissueOutcome::Rejected(RefreshRejection::Invalid)),
        }

        let user = UserClaims {
            user_key: claims.sub,
            email: claims.email,
        };
        let access_token = self.generate_access_token(&user)?;
        let refresh_token = self.generate_refresh_token(&user).await?;

        Ok(ReissueOutcome::Issued(TokenPair {
            access_token,
            refresh_token,
        }))
    }

    /// Adds a refresh token to the blacklist. Idempotent; the entry expires
    /// with the token's own remaining lifetime.
    pub async fn blacklist_refresh_token(&self, refresh_token: &str) -> Result<(), AppError> {
        let ttl = self.remaining_ttl(refresh_token);
        self.store
            .add_to_blacklist(refresh_token, ttl)
            .await
            .map_err(|e| {
                error!("Error blacklisting refresh token: {}", e);
                AppError::new(
                    ErrorType::InternalServerError,
                    "Something went wrong. Please try again later.",
                )
            })
    }

    /// Logout for a single session: blacklists the presented token and drops
    /// the identity's stored record when it still points at this token.
    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<(), AppError> {
        self.blacklist_refresh_token(refresh_token).await?;

        if let Ok(claims) = self.decode_token(refresh_token, TokenType::Refresh) {
            let stored = self.store.current_for(&claims.email).await.map_err(|e| {
                error!("Error reading refresh token record: {}", e);
                AppError::new(
                    ErrorType::InternalServerError,
                    "Something went wrong. Please try again later.",
                )
            })?;
            if stored.as_deref() == Some(refresh_token) {
                self.store.delete(&claims.email).await.map_err(|e| {
                    error!("Error deleting refresh token record: {}", e);
                    AppError::new(
                        ErrorType::InternalServerError,
                        "Something went wrong. Please try again later.",
                    )
                })?;
            }
        }
        Ok(())
    }

    pub async fn is_refresh_token_blacklisted(
        &self,
        refresh_token: &str,
    ) -> Result<bool, AppError> {
        self.store.in_blacklist(refresh_token).await.map_err(|e| {
            error!("Error checking token blacklist: {}", e);
            AppError::new(
                ErrorType::InternalServerError,
                "Something went wrong. Please try again later.",
            )
        })
    }

    /// Blacklists and deletes every refresh-token record owned by `email`.
    /// Used by logout-everywhere and account-lock flows. Failures on a record
    /// are reported, not fatal, and never roll back completed pairs.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_all_user_tokens(
        &self,
        email: &str,
    ) -> Result<InvalidationReport, AppError> {
        let mut report = InvalidationReport::default();

        let tokens = match self.store.current_for(email).await {
            Ok(Some(token)) => vec![token],
            Ok(None) => vec![],
            Err(e) => {
                error!("Error listing refresh tokens for {}: {}", email, e);
                return Err(AppError::new(
                    ErrorType::InternalServerError,
                    "Something went wrong. Please try again later.",
                ));
            }
        };

        for token in tokens {
            // Blacklist first so a crash between the two steps leaves the
            // token unusable rather than resurrectable.
            if let Err(e) = self
                .store
                .add_to_blacklist(&token, self.remaining_ttl(&token))
                .await
            {
                error!("Error blacklisting token during bulk invalidation: {}", e);
                report.failures.push(token);
                continue;
            }
            if let Err(e) = self.store.delete(email).await {
                error!("Error deleting token record during bulk invalidation: {}", e);
                report.failures.push(token);
                continue;
            }
            report.invalidated += 1;
        }
        Ok(report)
    }

    /// Validates an access token by signature and expiry only; access tokens
    /// are stateless and never persisted.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, RefreshRejection> {
        self.decode_token(token, TokenType::Access)
    }

    pub fn access_expiration_secs(&self) -> u64 {
        self.config.access_expiration_secs
    }

    fn encode_claims(
        &self,
        user: &UserClaims,
        token_type: TokenType,
        expiration_secs: u64,
    ) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.user_key.clone(),
            email: user.email.clone(),
            iss: self.config.jwt_issuer.clone(),
            jti: nanoid!(),
            iat: now,
            exp: now + expiration_secs as i64,
            token_type,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("Error signing token: {:?}", e);
            AppError::new(ErrorType::InternalServerError, "Failed to sign token.")
        })
    }

    fn decode_token(&self, token: &str, expected: TokenType) -> Result<Claims, RefreshRejection> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                if e.kind() == &jsonwebtoken::errors::ErrorKind::ExpiredSignature {
                    RefreshRejection::Expired
                } else {
                    RefreshRejection::Invalid
                }
            })?;
        if token_data.claims.token_type != expected {
            return Err(RefreshRejection::Invalid);
        }
        Ok(token_data.claims)
    }

    /// Remaining lifetime of a token in seconds. Falls back to the full
    /// refresh lifetime when the token cannot be decoded; opaque garbage then
    /// stays blacklisted at least as long as any live token could.
    fn remaining_ttl(&self, token: &str) -> u64 {
        let mut lenient = self.validation.clone();
        lenient.validate_exp = false;
        match decode::<Claims>(token, &self.decoding_key, &lenient) {
            Ok(data) => {
                let remaining = data.claims.exp - Utc::now().timestamp();
                if remaining > 0 {
                    remaining as u64
                } else {
                    60
                }
            }
            Err(_) => self.config.refresh_expiration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::token_store::StoreError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// In-memory stand-in for the Valkey store. TTLs are accepted and ignored;
    /// lifecycle tests only need set semantics, not expiry.
    #[derive(Default)]
    struct MemoryTokenStore {
        by_owner: Mutex<HashMap<String, String>>,
        by_token: Mutex<HashMap<String, String>>,
        blacklist: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl TokenStore for MemoryTokenStore {
        async fn save(&self, email: &str, token: &str, _ttl: u64) -> Result<(), StoreError> {
            let mut by_owner = self.by_owner.lock().unwrap();
            let mut by_token = self.by_token.lock().unwrap();
            if let Some(previous) = by_owner.insert(email.to_string(), token.to_string()) {
                by_token.remove(&previous);
            }
            by_token.insert(token.to_string(), email.to_string());
            Ok(())
        }

        async fn current_for(&self, email: &str) -> Result<Option<String>, StoreError> {
            Ok(self.by_owner.lock().unwrap().get(email).cloned())
        }

        async fn claim(&self, token: &str) -> Result<Option<String>, StoreError> {
            let mut by_token = self.by_token.lock().unwrap();
            let owner = by_token.remove(token);
            if let Some(ref owner) = owner {
                let mut by_owner = self.by_owner.lock().unwrap();
                if by_owner.get(owner).map(String::as_str) == Some(token) {
                    by_owner.remove(owner);
                }
            }
            Ok(owner)
        }

        async fn delete(&self, email: &str) -> Result<Option<String>, StoreError> {
            let removed = self.by_owner.lock().unwrap().remove(email);
            if let Some(ref token) = removed {
                self.by_token.lock().unwrap().remove(token);
            }
            Ok(removed)
        }

        async fn add_to_blacklist(&self, token: &str, _ttl: u64) -> Result<(), StoreError> {
            self.blacklist.lock().unwrap().insert(token.to_string());
            Ok(())
        }

        async fn in_blacklist(&self, token: &str) -> Result<bool, StoreError> {
            Ok(self.blacklist.lock().unwrap().contains(token))
        }
    }

    fn test_service() -> TokenService<MemoryTokenStore> {
        TokenService::new(
            MemoryTokenStore::default(),
            TokenConfig {
                jwt_secret: "unit-test-secret".to_string(),
                jwt_issuer: "talktrack-test".to_string(),
                access_expiration_secs: 1800,
                refresh_expiration_secs: 3600,
            },
        )
    }

    fn alice() -> UserClaims {
        UserClaims {
            user_key: "usr_alice".to_string(),
            email: "a@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn access_token_round_trips_identity() {
        let service = test_service();
        let token = service.generate_access_token(&alice()).unwrap();

        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.sub, "usr_alice");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[tokio::test]
    async fn refresh_token_is_not_accepted_as_access_token() {
        let service = test_service();
        let refresh = service.generate_refresh_token(&alice()).await.unwrap();

        assert!(matches!(
            service.validate_access_token(&refresh),
            Err(RefreshRejection::Invalid)
        ));
    }

    #[tokio::test]
    async fn reissue_rotates_and_old_token_is_single_use() {
        let service = test_service();
        let r1 = service.generate_refresh_token(&alice()).await.unwrap();

        let pair = match service.reissue(&r1).await.unwrap() {
            ReissueOutcome::Issued(pair) => pair,
            ReissueOutcome::Rejected(r) => panic!("first reissue rejected: {}", r),
        };
        assert_ne!(pair.refresh_token, r1);
        assert!(service
            .validate_access_token(&pair.access_token)
            .is_ok());

        // R1 was consumed by the rotation and must never work again.
        match service.reissue(&r1).await.unwrap() {
            ReissueOutcome::Rejected(_) => {}
            ReissueOutcome::Issued(_) => panic!("superseded token produced a reissue"),
        }

        // The replacement token is live.
        match service.reissue(&pair.refresh_token).await.unwrap() {
            ReissueOutcome::Issued(_) => {}
            ReissueOutcome::Rejected(r) => panic!("fresh token rejected: {}", r),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_reissue_has_exactly_one_winner() {
        let service = std::sync::Arc::new(test_service());
        let token = service.generate_refresh_token(&alice()).await.unwrap();

        // Two simultaneous exchanges of the same token race on the store's
        // atomic claim; exactly one may mint a pair.
        let first = tokio::spawn({
            let service = service.clone();
            let token = token.clone();
            async move { service.reissue(&token).await.unwrap() }
        });
        let second = tokio::spawn({
            let service = service.clone();
            let token = token.clone();
            async move { service.reissue(&token).await.unwrap() }
        });
        let outcomes = [first.await.unwrap(), second.await.unwrap()];

        let issued = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, ReissueOutcome::Issued(_)))
            .count();
        assert_eq!(issued, 1);
    }

    #[tokio::test]
    async fn blacklisted_token_never_reissues() {
        let service = test_service();
        let token = service.generate_refresh_token(&alice()).await.unwrap();

        service.blacklist_refresh_token(&token).await.unwrap();
        match service.reissue(&token).await.unwrap() {
            ReissueOutcome::Rejected(rejection) => {
                assert_eq!(rejection, RefreshRejection::Blacklisted)
            }
            ReissueOutcome::Issued(_) => panic!("blacklisted token produced a reissue"),
        }
    }

    #[tokio::test]
    async fn unknown_identity_is_a_typed_not_found() {
        let service = test_service();
        let token = service.generate_refresh_token(&alice()).await.unwrap();
        service.store.delete("a@example.com").await.unwrap();

        match service.reissue(&token).await.unwrap() {
            ReissueOutcome::Rejected(rejection) => {
                assert_eq!(rejection, RefreshRejection::NotFound)
            }
            ReissueOutcome::Issued(_) => panic!("reissue succeeded without a stored record"),
        }
    }

    #[tokio::test]
    async fn expired_token_is_a_typed_expiry_rejection() {
        let service = test_service();
        // Sign an already-expired refresh token with the service's own key.
        // Two minutes in the past clears the default decode leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "usr_alice".to_string(),
            email: "a@example.com".to_string(),
            iss: "talktrack-test".to_string(),
            jti: nanoid!(),
            iat: now - 600,
            exp: now - 120,
            token_type: TokenType::Refresh,
        };
        let expired = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("unit-test-secret".as_bytes()),
        )
        .unwrap();

        match service.reissue(&expired).await.unwrap() {
            ReissueOutcome::Rejected(rejection) => {
                assert_eq!(rejection, RefreshRejection::Expired)
            }
            ReissueOutcome::Issued(_) => panic!("expired token produced a reissue"),
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected_as_invalid() {
        let service = test_service();
        match service.reissue("not-a-jwt").await.unwrap() {
            ReissueOutcome::Rejected(rejection) => {
                assert_eq!(rejection, RefreshRejection::Invalid)
            }
            ReissueOutcome::Issued(_) => panic!("garbage token produced a reissue"),
        }
    }

    #[tokio::test]
    async fn fresh_login_supersedes_previous_session() {
        let service = test_service();
        let first = service.generate_refresh_token(&alice()).await.unwrap();
        let second = service.generate_refresh_token(&alice()).await.unwrap();
        assert_ne!(first, second);

        match service.reissue(&first).await.unwrap() {
            ReissueOutcome::Rejected(rejection) => {
                assert_eq!(rejection, RefreshRejection::Invalid)
            }
            ReissueOutcome::Issued(_) => panic!("superseded login token produced a reissue"),
        }
        match service.reissue(&second).await.unwrap() {
            ReissueOutcome::Issued(_) => {}
            ReissueOutcome::Rejected(r) => panic!("current login token rejected: {}", r),
        }
    }

    #[tokio::test]
    async fn single_session_logout_revokes_and_clears_record() {
        let service = test_service();
        let token = service.generate_refresh_token(&alice()).await.unwrap();

        service.revoke_refresh_token(&token).await.unwrap();

        assert!(service.is_refresh_token_blacklisted(&token).await.unwrap());
        assert!(service
            .store
            .current_for("a@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn invalidate_all_leaves_no_active_records() {
        let service = test_service();
        let token = service.generate_refresh_token(&alice()).await.unwrap();

        let report = service
            .invalidate_all_user_tokens("a@example.com")
            .await
            .unwrap();
        assert_eq!(report.invalidated, 1);
        assert!(report.failures.is_empty());

        assert!(service.is_refresh_token_blacklisted(&token).await.unwrap());
        assert!(service
            .store
            .current_for("a@example.com")
            .await
            .unwrap()
            .is_none());
        match service.reissue(&token).await.unwrap() {
            ReissueOutcome::Rejected(rejection) => {
                assert_eq!(rejection, RefreshRejection::Blacklisted)
            }
            ReissueOutcome::Issued(_) => panic!("invalidated token produced a reissue"),
        }
    }

    #[tokio::test]
    async fn invalidate_all_is_a_no_op_without_records() {
        let service = test_service();
        let report = service
            .invalidate_all_user_tokens("nobody@example.com")
            .await
            .unwrap();
        assert_eq!(report.invalidated, 0);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn blacklist_membership_is_exact() {
        let service = test_service();
        service.blacklist_refresh_token("xyz").await.unwrap();

        assert!(service.is_refresh_token_blacklisted("xyz").await.unwrap());
        assert!(!service.is_refresh_token_blacklisted("abc").await.unwrap());

        // Re-blacklisting is a no-op, not an error.
        service.blacklist_refresh_token("xyz").await.unwrap();
        assert!(service.is_refresh_token_blacklisted("xyz").await.unwrap());
    }
}
