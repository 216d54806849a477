use crate::db::entity::script::{AnalysisStatus, Script, ScriptAnalysisResult};
use sqlx::PgPool;

/// Inserts a new script owned by `user_id` and returns its id.
pub async fn create_script(
    pool: &PgPool,
    user_id: i64,
    title: &str,
    content: &str,
    accent: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO scripts (user_id, title, content, accent)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(accent)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Retrieves one page of a user's scripts, newest first.
pub async fn get_scripts_by_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
    page: i64,
) -> Result<Vec<Script>, sqlx::Error> {
    sqlx::query_as::<_, Script>(
        r#"
        SELECT id, user_id, title, content, accent, created_at
        FROM scripts
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(pool)
    .await
}

pub async fn count_scripts_by_user(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scripts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Retrieves a script by id.
///
/// # Errors
///
/// Returns `sqlx::Error::RowNotFound` when the script does not exist.
pub async fn get_script_by_id(pool: &PgPool, script_id: i64) -> Result<Script, sqlx::Error> {
    sqlx::query_as::<_, Script>(
        r#"
        SELECT id, user_id, title, content, accent, created_at
        FROM scripts WHERE id = $1
        "#,
    )
    .bind(script_id)
    .fetch_optional(pool)
    .await?
    .ok_or(sqlx::Error::RowNotFound)
}

/// Returns the owning user id of a script.
pub async fn get_script_writer(pool: &PgPool, script_id: i64) -> Result<i64, sqlx::Error> {
    let (user_id,): (i64,) = sqlx::query_as("SELECT user_id FROM scripts WHERE id = $1")
        .bind(script_id)
        .fetch_optional(pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(user_id)
}

/// Deletes a script and, through cascade, its analysis results.
pub async fn delete_script(pool: &PgPool, script_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM scripts WHERE id = $1")
        .bind(script_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Inserts an analysis result row and returns its id.
pub async fn create_result(
    pool: &PgPool,
    script_id: i64,
    record_url: &str,
    payload: &serde_json::Value,
    status: AnalysisStatus,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO script_analysis_results (script_id, record_url, payload, status)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(script_id)
    .bind(record_url)
    .bind(payload)
    .bind(status)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Retrieves an analysis result by id.
///
/// # Errors
///
/// Returns `sqlx::Error::RowNotFound` when the result does not exist.
pub async fn get_result_by_id(
    pool: &PgPool,
    result_id: i64,
) -> Result<ScriptAnalysisResult, sqlx::Error> {
    sqlx::query_as::<_, ScriptAnalysisResult>(
        r#"
        SELECT id, script_id, record_url, payload, status, created_at
        FROM script_analysis_results WHERE id = $1
        "#,
    )
    .bind(result_id)
    .fetch_optional(pool)
    .await?
    .ok_or(sqlx::Error::RowNotFound)
}

/// Retrieves one page of analysis results for a script, newest first.
pub async fn get_results_by_script(
    pool: &PgPool,
    script_id: i64,
    limit: i64,
    page: i64,
) -> Result<Vec<ScriptAnalysisResult>, sqlx::Error> {
    sqlx::query_as::<_, ScriptAnalysisResult>(
        r#"
        SELECT id, script_id, record_url, payload, status, created_at
        FROM script_analysis_results
        WHERE script_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(script_id)
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(pool)
    .await
}

pub async fn count_results_by_script(pool: &PgPool, script_id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM script_analysis_results WHERE script_id = $1")
            .bind(script_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn delete_result(pool: &PgPool, result_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM script_analysis_results WHERE id = $1")
        .bind(result_id)
        .execute(pool)
        .await?;
    Ok(())
}
