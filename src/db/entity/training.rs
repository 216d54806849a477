use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct TrainingSentence {
    pub id: i64,
    pub training_id: i64,
    pub sentence: String,
}
