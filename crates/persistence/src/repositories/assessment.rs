//! Assessment repository.

use sqlx::PgPool;

use crate::entities::AssessmentEntity;
use crate::metrics::QueryTimer;

/// Repository for assessment results.
#[derive(Clone)]
pub struct AssessmentRepository {
    pool: PgPool,
}

impl AssessmentRepository {
    /// Creates a new AssessmentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_email: &str,
        phq9_score: i32,
        gad7_score: i32,
    ) -> Result<AssessmentEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_assessment");
        let result = sqlx::query_as::<_, AssessmentEntity>(
            r#"
            INSERT INTO assessments (user_email, phq9_score, gad7_score)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_email)
        .bind(phq9_score)
        .bind(gad7_score)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
