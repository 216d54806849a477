use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Script {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub accent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One analysis run over a recorded reading of a script. `payload` is the raw
/// metric document returned by the analysis pipeline, stored as JSONB.
#[derive(Debug, FromRow)]
pub struct ScriptAnalysisResult {
    pub id: i64,
    pub script_id: i64,
    pub record_url: String,
    pub payload: serde_json::Value,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, sqlx::Type)]
#[sqlx(type_name = "analysis_status")]
pub enum AnalysisStatus {
    #[sqlx(rename = "PENDING")]
    Pending,
    #[sqlx(rename = "DONE")]
    Done,
}
