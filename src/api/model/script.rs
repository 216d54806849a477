use crate::db::entity::script::{AnalysisStatus, Script, ScriptAnalysisResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    #[schema(example = "Morning news reading")]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content must be between 1 and 10000 characters"
    ))]
    #[schema(example = "The quick brown fox jumps over the lazy dog.")]
    pub content: String,
    #[schema(example = "standard")]
    pub accent: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptResponse {
    #[schema(example = 42)]
    pub id: i64,
    pub title: String,
    pub content: String,
    pub accent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Script> for ScriptResponse {
    fn from(script: Script) -> Self {
        ScriptResponse {
            id: script.id,
            title: script.title,
            content: script.content,
            accent: script.accent,
            created_at: script.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptListItem {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<Script> for ScriptListItem {
    fn from(script: Script) -> Self {
        ScriptListItem {
            id: script.id,
            title: script.title,
            created_at: script.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptList {
    pub scripts: Vec<ScriptListItem>,
    #[schema(example = 1)]
    pub current_page: i64,
    #[schema(example = 120)]
    pub total_items: i64,
    #[schema(example = 6)]
    pub total_pages: i64,
    #[schema(example = 20)]
    pub items_per_page: i64,
}

/// Posted by the analysis pipeline once a recording has been scored.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResultRequest {
    #[validate(length(min = 1, message = "Record URL must not be empty"))]
    #[schema(
        example = "https://bucket.s3.ap-northeast-2.amazonaws.com/record/5f3a_take1.wav"
    )]
    pub record_url: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResultResponse {
    pub id: i64,
    pub script_id: i64,
    #[schema(
        example = "https://bucket.s3.ap-northeast-2.amazonaws.com/record/5f3a_take1.wav"
    )]
    pub record_url: String,
    /// Raw metric document from the analysis pipeline.
    pub payload: serde_json::Value,
    #[schema(example = "pending")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<ScriptAnalysisResult> for AnalysisResultResponse {
    fn from(result: ScriptAnalysisResult) -> Self {
        AnalysisResultResponse {
            id: result.id,
            script_id: result.script_id,
            record_url: result.record_url,
            payload: result.payload,
            status: match result.status {
                AnalysisStatus::Pending => "pending".to_string(),
                AnalysisStatus::Done => "done".to_string(),
            },
            created_at: result.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResultList {
    pub results: Vec<AnalysisResultResponse>,
    pub current_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub items_per_page: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSubmitted {
    pub script_id: i64,
    pub result_id: i64,
    pub record_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn script_request_rejects_empty_title() {
        let request = ScriptRequest {
            title: "".to_string(),
            content: "hello".to_string(),
            accent: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn script_response_serializes_camel_case() {
        let response = ScriptResponse {
            id: 1,
            title: "t".to_string(),
            content: "c".to_string(),
            accent: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
