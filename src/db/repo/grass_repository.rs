use crate::db::entity::grass::GrassRecord;
use sqlx::PgPool;

/// Records one practice-activity event for today: inserts the day's row or
/// increments its count.
pub async fn add_grass_record(pool: &PgPool, user_id: i64) -> Result<GrassRecord, sqlx::Error> {
    sqlx::query_as::<_, GrassRecord>(
        r#"
        INSERT INTO grass_records (user_id, record_date, count)
        VALUES ($1, CURRENT_DATE, 1)
        ON CONFLICT (user_id, record_date)
        DO UPDATE SET count = grass_records.count + 1
        RETURNING id, user_id, record_date, count
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}
