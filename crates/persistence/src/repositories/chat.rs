//! Chat session and message repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ChatMessageEntity, ChatSenderDb, ChatSessionEntity, MonthlyCountEntity};
use crate::metrics::QueryTimer;

/// Repository for chat operations.
#[derive(Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    /// Creates a new ChatRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_session(&self, user_email: &str) -> Result<ChatSessionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_chat_session");
        let result = sqlx::query_as::<_, ChatSessionEntity>(
            "INSERT INTO chat_sessions (user_email) VALUES ($1) RETURNING *",
        )
        .bind(user_email)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_session(&self, id: Uuid) -> Result<Option<ChatSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_chat_session");
        let result =
            sqlx::query_as::<_, ChatSessionEntity>("SELECT * FROM chat_sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        result
    }

    /// Sessions for a user, newest first.
    pub async fn list_sessions(
        &self,
        user_email: &str,
    ) -> Result<Vec<ChatSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_chat_sessions");
        let result = sqlx::query_as::<_, ChatSessionEntity>(
            r#"
            SELECT * FROM chat_sessions
            WHERE user_email = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn add_message(
        &self,
        session_id: Uuid,
        sender: ChatSenderDb,
        message: &str,
    ) -> Result<ChatMessageEntity, sqlx::Error> {
        let timer = QueryTimer::new("add_chat_message");
        let result = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            INSERT INTO chat_messages (session_id, sender, message)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(sender)
        .bind(message)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Messages in a session, oldest first.
    pub async fn history(&self, session_id: Uuid) -> Result<Vec<ChatMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("chat_history");
        let result = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            SELECT * FROM chat_messages
            WHERE session_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Latest messages across all of a user's sessions, newest first.
    pub async fn recent_for_user(
        &self,
        user_email: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("recent_chat_messages_for_user");
        let result = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            SELECT m.* FROM chat_messages m
            JOIN chat_sessions s ON s.id = m.session_id
            WHERE s.user_email = $1
            ORDER BY m.created_at DESC
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

    /// Message counts per UTC calendar month, oldest first.
    pub async fn monthly_message_counts(&self) -> Result<Vec<MonthlyCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("monthly_message_counts");
        let result = sqlx::query_as::<_, MonthlyCountEntity>(
            r#"
            SELECT to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM') AS month,
                   COUNT(*) AS count
            FROM chat_messages
            GROUP BY month
            ORDER BY month ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
