use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "user_id, name, email, password_hash, image, place_ids, created_at";

/// User row from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub image: String,
    /// Ids of the places this user created, in creation order
    pub place_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new user record
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Uuid,
    pub name: String,
    /// Must already be lowercase-normalized
    pub email: String,
    pub password_hash: String,
    pub image: String,
}

/// Repository for user operations
pub struct UserRepo;

impl UserRepo {
    /// Create a new user with an empty place collection. A duplicate
    /// email surfaces as a unique-violation database error.
    pub async fn create(pool: &PgPool, user: &NewUser) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO "user" (user_id, name, email, password_hash, image) VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(user.user_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.image)
        .execute(pool)
        .await
        .context("Failed to create user")?;
        Ok(())
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" WHERE email = $1"#
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;
        Ok(row)
    }

    pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" WHERE user_id = $1"#
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by id")?;
        Ok(row)
    }

    /// List all users. Callers map rows to the client model, which
    /// drops the password hash.
    pub async fn list(pool: &PgPool) -> Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" ORDER BY created_at"#
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;
        Ok(rows)
    }
}

/// Whether an error chain contains a Postgres unique violation (23505),
/// used as the backstop for the duplicate-email pre-check.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}
