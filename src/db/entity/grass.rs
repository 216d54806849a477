use chrono::NaiveDate;
use sqlx::FromRow;

/// One practice-activity cell per user per day; `count` increments with each
/// completed training session.
#[derive(Debug, FromRow)]
pub struct GrassRecord {
    pub id: i64,
    pub user_id: i64,
    pub record_date: NaiveDate,
    pub count: i32,
}
