use sqlx::SqlitePool;

use crate::models::Coupon;

const COUPON_SELECT: &str = "SELECT c.id, c.code, c.used, c.generated_at, c.advantage_id, \
     a.name AS advantage_name, c.student_id, su.name AS student_name, cu.name AS company_name \
     FROM coupons c \
     JOIN advantages a ON a.id = c.advantage_id \
     JOIN users su ON su.id = c.student_id \
     JOIN users cu ON cu.id = a.company_id";

pub async fn find_by_code(db: &SqlitePool, code: &str) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as::<_, Coupon>(&format!("{COUPON_SELECT} WHERE c.code = ?"))
        .bind(code)
        .fetch_optional(db)
        .await
}

/// Marks a coupon used; false when it was already used.
pub async fn mark_used(db: &SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
    let affected = sqlx::query("UPDATE coupons SET used = 1 WHERE code = ? AND used = 0")
        .bind(code)
        .execute(db)
        .await?
        .rows_affected();

    Ok(affected > 0)
}

pub async fn fetch_by_student(
    db: &SqlitePool,
    student_id: i64,
) -> Result<Vec<Coupon>, sqlx::Error> {
    sqlx::query_as::<_, Coupon>(&format!(
        "{COUPON_SELECT} WHERE c.student_id = ? ORDER BY c.generated_at DESC"
    ))
    .bind(student_id)
    .fetch_all(db)
    .await
}

pub async fn company_coupon_count(
    db: &SqlitePool,
    company_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM coupons c \
         JOIN advantages a ON a.id = c.advantage_id \
         WHERE a.company_id = ?",
    )
    .bind(company_id)
    .fetch_one(db)
    .await
}

pub async fn fetch_by_company(
    db: &SqlitePool,
    company_id: i64,
) -> Result<Vec<Coupon>, sqlx::Error> {
    sqlx::query_as::<_, Coupon>(&format!(
        "{COUPON_SELECT} WHERE a.company_id = ? ORDER BY c.generated_at DESC"
    ))
    .bind(company_id)
    .fetch_all(db)
    .await
}
