use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::repository::UserRepository;
use marquee_core::{AccountError, User};
use marquee_shared::Masked;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: Masked(row.email),
            password_hash: Masked(row.password_hash),
            created_at: row.created_at,
        }
    }
}

fn storage(err: sqlx::Error) -> AccountError {
    AccountError::Storage(err.to_string())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &User) -> Result<(), AccountError> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (username) DO NOTHING",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.email.expose())
        .bind(user.password_hash.expose())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(AccountError::UsernameTaken(user.username.clone()));
        }
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(User::from))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AccountError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(User::from))
    }
}
