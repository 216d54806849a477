use crate::db::entity::user::Users;
use sqlx::PgPool;

/// Retrieves a user by their email address.
///
/// # Errors
///
/// Returns `sqlx::Error::RowNotFound` when no user exists for the email.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Users, sqlx::Error> {
    sqlx::query_as::<_, Users>(
        r#"
        SELECT id, key, email, nickname, image_url, created_at, updated_at
        FROM users WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or(sqlx::Error::RowNotFound)
}
