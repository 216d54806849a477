use crate::db::entity::training::TrainingSentence;
use sqlx::PgPool;

/// Picks one random practice sentence from a training set.
///
/// # Errors
///
/// Returns `sqlx::Error::RowNotFound` when the training set is empty or does
/// not exist.
pub async fn get_random_sentence(
    pool: &PgPool,
    training_id: i64,
) -> Result<TrainingSentence, sqlx::Error> {
    sqlx::query_as::<_, TrainingSentence>(
        r#"
        SELECT id, training_id, sentence
        FROM training_sentences
        WHERE training_id = $1
        ORDER BY random()
        LIMIT 1
        "#,
    )
    .bind(training_id)
    .fetch_optional(pool)
    .await?
    .ok_or(sqlx::Error::RowNotFound)
}
