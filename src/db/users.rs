use sqlx::{FromRow, SqlitePool};

use crate::models::Role;

/// Credential row shared by all three account kinds.
#[derive(Debug, Clone, FromRow)]
pub struct AuthRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

pub async fn find_auth_by_email(
    db: &SqlitePool,
    email: &str,
) -> Result<Option<AuthRow>, sqlx::Error> {
    sqlx::query_as::<_, AuthRow>(
        "SELECT id, name, email, password_hash, role FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_auth_by_id(db: &SqlitePool, id: i64) -> Result<Option<AuthRow>, sqlx::Error> {
    sqlx::query_as::<_, AuthRow>(
        "SELECT id, name, email, password_hash, role FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// True when another user already claimed the email. `exclude` skips the
/// user being updated so saving an unchanged profile is not a conflict.
pub async fn email_taken(
    db: &SqlitePool,
    email: &str,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE email = ? AND (? IS NULL OR id != ?)",
    )
    .bind(email)
    .bind(exclude)
    .bind(exclude)
    .fetch_one(db)
    .await?;

    Ok(count > 0)
}
