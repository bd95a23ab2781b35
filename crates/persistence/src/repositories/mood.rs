//! Mood log repository.

use sqlx::PgPool;

use crate::entities::{MoodCountEntity, MoodLogEntity};
use crate::metrics::QueryTimer;

/// Repository for mood log operations.
#[derive(Clone)]
pub struct MoodRepository {
    pool: PgPool,
}

impl MoodRepository {
    /// Creates a new MoodRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a mood entry.
    pub async fn create(
        &self,
        user_email: &str,
        mood: &str,
        intensity: i32,
    ) -> Result<MoodLogEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_mood_log");
        let result = sqlx::query_as::<_, MoodLogEntity>(
            r#"
            INSERT INTO mood_logs (user_email, mood, intensity)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_email)
        .bind(mood)
        .bind(intensity)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Latest entries for a user, newest first.
    pub async fn recent_by_email(
        &self,
        user_email: &str,
        limit: i64,
    ) -> Result<Vec<MoodLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("recent_mood_logs");
        let result = sqlx::query_as::<_, MoodLogEntity>(
            r#"
            SELECT * FROM mood_logs
            WHERE user_email = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_email)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Latest entries for a user in chronological order.
    pub async fn recent_chronological(
        &self,
        user_email: &str,
        limit: i64,
    ) -> Result<Vec<MoodLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("recent_mood_logs_chronological");
        let result = sqlx::query_as::<_, MoodLogEntity>(
            r#"
            SELECT * FROM (
                SELECT * FROM mood_logs
                WHERE user_email = $1
                ORDER BY created_at DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_email)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Entry counts per mood across all users, most common first.
    pub async fn distribution(&self) -> Result<Vec<MoodCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mood_distribution");
        let result = sqlx::query_as::<_, MoodCountEntity>(
            r#"
            SELECT mood, COUNT(*) AS count
            FROM mood_logs
            GROUP BY mood
            ORDER BY count DESC, mood ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
