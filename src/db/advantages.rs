use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{Advantage, NewAdvantageRequest, UpdateAdvantageRequest};

const ADVANTAGE_SELECT: &str = "SELECT a.id, a.name, a.description, a.cost_in_coins, \
     a.available_quantity, a.photo, a.company_id, u.name AS company_name, \
     a.times_redeemed, a.created_at, a.updated_at \
     FROM advantages a \
     JOIN users u ON u.id = a.company_id";

/// Student catalog: sold-out advantages (quantity 0) are hidden.
pub async fn fetch_catalog(db: &SqlitePool) -> Result<Vec<Advantage>, sqlx::Error> {
    sqlx::query_as::<_, Advantage>(&format!(
        "{ADVANTAGE_SELECT} \
         WHERE a.available_quantity IS NULL OR a.available_quantity > 0 \
         ORDER BY a.created_at DESC"
    ))
    .fetch_all(db)
    .await
}

pub async fn find_advantage(db: &SqlitePool, id: i64) -> Result<Option<Advantage>, sqlx::Error> {
    sqlx::query_as::<_, Advantage>(&format!("{ADVANTAGE_SELECT} WHERE a.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Owner view: includes sold-out items so the company can reactivate them.
pub async fn fetch_by_company(
    db: &SqlitePool,
    company_id: i64,
) -> Result<Vec<Advantage>, sqlx::Error> {
    sqlx::query_as::<_, Advantage>(&format!(
        "{ADVANTAGE_SELECT} WHERE a.company_id = ? ORDER BY a.created_at DESC"
    ))
    .bind(company_id)
    .fetch_all(db)
    .await
}

pub async fn insert_advantage(
    db: &SqlitePool,
    req: &NewAdvantageRequest,
) -> Result<Advantage, sqlx::Error> {
    let now = Utc::now();

    let id = sqlx::query(
        "INSERT INTO advantages \
             (company_id, name, description, cost_in_coins, available_quantity, photo, \
             times_redeemed, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
    )
    .bind(req.company_id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.cost_in_coins)
    .bind(req.available_quantity)
    .bind(&req.photo)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?
    .last_insert_rowid();

    find_advantage(db, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_advantage(
    db: &SqlitePool,
    id: i64,
    req: UpdateAdvantageRequest,
) -> Result<Option<Advantage>, sqlx::Error> {
    let mut current = match find_advantage(db, id).await? {
        Some(a) => a,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name;
    }
    if let Some(description) = req.description {
        current.description = description;
    }
    if let Some(cost) = req.cost_in_coins {
        current.cost_in_coins = cost;
    }
    if let Some(quantity) = req.available_quantity {
        current.available_quantity = quantity;
    }
    if let Some(photo) = req.photo {
        current.photo = photo;
    }
    current.updated_at = Utc::now();

    sqlx::query(
        "UPDATE advantages \
         SET name = ?, description = ?, cost_in_coins = ?, available_quantity = ?, \
             photo = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&current.name)
    .bind(&current.description)
    .bind(current.cost_in_coins)
    .bind(current.available_quantity)
    .bind(&current.photo)
    .bind(current.updated_at)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn delete_advantage(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM advantages WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn coupon_count(db: &SqlitePool, advantage_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM coupons WHERE advantage_id = ?")
        .bind(advantage_id)
        .fetch_one(db)
        .await
}

/// Restocks a sold-out advantage with a fresh quantity.
pub async fn reactivate_advantage(
    db: &SqlitePool,
    id: i64,
    quantity: i64,
) -> Result<Option<Advantage>, sqlx::Error> {
    let affected = sqlx::query(
        "UPDATE advantages SET available_quantity = ?, updated_at = ? WHERE id = ?",
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    if affected == 0 {
        return Ok(None);
    }

    find_advantage(db, id).await
}
