use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{NewStudentRequest, Student, UpdateStudentRequest};

const STUDENT_SELECT: &str = "SELECT u.id, u.name, u.email, s.cpf, s.rg, s.address, s.course, \
     s.balance, s.institution_id, i.name AS institution_name \
     FROM users u \
     JOIN students s ON s.user_id = u.id \
     JOIN institutions i ON i.id = s.institution_id";

pub async fn find_student(db: &SqlitePool, id: i64) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("{STUDENT_SELECT} WHERE u.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_students(db: &SqlitePool) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("{STUDENT_SELECT} ORDER BY u.name"))
        .fetch_all(db)
        .await
}

pub async fn fetch_students_by_institution(
    db: &SqlitePool,
    institution_id: i64,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "{STUDENT_SELECT} WHERE s.institution_id = ? ORDER BY u.name"
    ))
    .bind(institution_id)
    .fetch_all(db)
    .await
}

pub async fn cpf_taken(db: &SqlitePool, cpf: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE cpf = ?")
        .bind(cpf)
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}

pub async fn insert_student(
    db: &SqlitePool,
    req: &NewStudentRequest,
    password_hash: &str,
) -> Result<Student, sqlx::Error> {
    let now = Utc::now();
    let mut tx = db.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, created_at) \
         VALUES (?, ?, ?, 'STUDENT', ?)",
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(password_hash)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    sqlx::query(
        "INSERT INTO students (user_id, cpf, rg, address, course, balance, institution_id) \
         VALUES (?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(user_id)
    .bind(&req.cpf)
    .bind(&req.rg)
    .bind(&req.address)
    .bind(&req.course)
    .bind(req.institution_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_student(db, user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_student(
    db: &SqlitePool,
    id: i64,
    req: UpdateStudentRequest,
    password_hash: Option<String>,
) -> Result<Option<Student>, sqlx::Error> {
    let mut current = match find_student(db, id).await? {
        Some(s) => s,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name;
    }
    if let Some(email) = req.email {
        current.email = email;
    }
    if let Some(rg) = req.rg {
        current.rg = rg;
    }
    if let Some(address) = req.address {
        current.address = address;
    }
    if let Some(course) = req.course {
        current.course = course;
    }
    if let Some(institution_id) = req.institution_id {
        current.institution_id = institution_id;
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

    sqlx::query(
        "UPDATE students SET rg = ?, address = ?, course = ?, institution_id = ? WHERE user_id = ?",
    )
    .bind(&current.rg)
    .bind(&current.address)
    .bind(&current.course)
    .bind(current.institution_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_student(db, id).await
}

pub async fn delete_student(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ? AND role = 'STUDENT'")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
