use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{Company, NewCompanyRequest, UpdateCompanyRequest};

const COMPANY_SELECT: &str = "SELECT u.id, u.name, u.email, c.cnpj, c.address \
     FROM users u \
     JOIN companies c ON c.user_id = u.id";

pub async fn find_company(db: &SqlitePool, id: i64) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>(&format!("{COMPANY_SELECT} WHERE u.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn cnpj_taken(db: &SqlitePool, cnpj: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies WHERE cnpj = ?")
        .bind(cnpj)
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}

pub async fn insert_company(
    db: &SqlitePool,
    req: &NewCompanyRequest,
    password_hash: &str,
) -> Result<Company, sqlx::Error> {
    let now = Utc::now();
    let mut tx = db.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, created_at) \
         VALUES (?, ?, ?, 'COMPANY', ?)",
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(password_hash)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    sqlx::query("INSERT INTO companies (user_id, cnpj, address) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(&req.cnpj)
        .bind(&req.address)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    find_company(db, user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_company(
    db: &SqlitePool,
    id: i64,
    req: UpdateCompanyRequest,
    password_hash: Option<String>,
) -> Result<Option<Company>, sqlx::Error> {
    let mut current = match find_company(db, id).await? {
        Some(c) => c,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name;
    }
    if let Some(email) = req.email {
        current.email = email;
    }
    if let Some(address) = req.address {
        current.address = Some(address);
    }

    let mut tx = db.begin().await?;

    sqlx::query("UPDATE users SET name = ?, email = ? WHERE id = ?")
        .bind(&current.name)
        .bind(&current.email)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if let Some(hash) = password_hash {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(hash)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("UPDATE companies SET address = ? WHERE user_id = ?")
        .bind(&current.address)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    find_company(db, id).await
}

pub async fn delete_company(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ? AND role = 'COMPANY'")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
