use sqlx::SqlitePool;

use crate::models::{Teacher, UpdateTeacherRequest};

const TEACHER_SELECT: &str = "SELECT u.id, u.name, u.email, t.cpf, t.department, t.balance, \
     t.institution_id, i.name AS institution_name, t.last_credit_period \
     FROM users u \
     JOIN teachers t ON t.user_id = u.id \
     JOIN institutions i ON i.id = t.institution_id";

pub async fn find_teacher(db: &SqlitePool, id: i64) -> Result<Option<Teacher>, sqlx::Error> {
    sqlx::query_as::<_, Teacher>(&format!("{TEACHER_SELECT} WHERE u.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Teachers whose last allotment does not match the given semester period.
pub async fn fetch_teachers_needing_credit(
    db: &SqlitePool,
    period: &str,
) -> Result<Vec<Teacher>, sqlx::Error> {
    sqlx::query_as::<_, Teacher>(&format!(
        "{TEACHER_SELECT} WHERE t.last_credit_period IS NULL OR t.last_credit_period != ? \
         ORDER BY u.id"
    ))
    .bind(period)
    .fetch_all(db)
    .await
}

pub async fn update_teacher(
    db: &SqlitePool,
    id: i64,
    req: UpdateTeacherRequest,
    password_hash: Option<String>,
) -> Result<Option<Teacher>, sqlx::Error> {
    let mut current = match find_teacher(db, id).await? {
        Some(t) => t,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name;
    }
    if let Some(email) = req.email {
        current.email = email;
    }
    if let Some(department) = req.department {
        current.department = department;
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

    sqlx::query("UPDATE teachers SET department = ? WHERE user_id = ?")
        .bind(&current.department)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    find_teacher(db, id).await
}
