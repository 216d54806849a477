use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentenceResponse {
    #[schema(example = 3)]
    pub training_id: i64,
    #[schema(example = "She sells seashells by the seashore.")]
    pub sentence: String,
}

/// Session state cached in Redis between start and end of a practice run.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSession {
    pub training_id: i64,
    pub sentence_id: i64,
}
