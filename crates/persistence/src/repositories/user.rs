//! User repository for database operations.

use sqlx::{PgConnection, PgPool};

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str = "id, email, password_hash, display_name, phone, created_at, updated_at";

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find a user by (normalized) email address.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create a new user account.
    ///
    /// A duplicate email surfaces as a unique violation.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
        phone: Option<&str>,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (email, password_hash, display_name, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .bind(phone)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lock a user row for the rest of the transaction.
    ///
    /// Grant updates for one user serialize on this lock.
    pub async fn lock_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE email = $1 FOR UPDATE",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }
}
