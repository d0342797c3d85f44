use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::models::CoinTransaction;

const TRANSACTION_SELECT: &str = "SELECT t.id, t.amount, t.occurred_at AS date, t.kind, t.reason, \
     t.sender_id, su.name AS sender_name, t.receiver_id, ru.name AS receiver_name \
     FROM transactions t \
     LEFT JOIN users su ON su.id = t.sender_id \
     LEFT JOIN users ru ON ru.id = t.receiver_id";

/// History for a user, newest first, either side of the ledger entry.
/// Date bounds are inclusive calendar days.
pub async fn fetch_user_transactions(
    db: &SqlitePool,
    user_id: i64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<CoinTransaction>, sqlx::Error> {
    let start: Option<DateTime<Utc>> = start_date
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());
    let end: Option<DateTime<Utc>> = end_date
        .and_then(|d| d.succ_opt())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());

    sqlx::query_as::<_, CoinTransaction>(&format!(
        "{TRANSACTION_SELECT} \
         WHERE (t.sender_id = ?1 OR t.receiver_id = ?1) \
           AND (?2 IS NULL OR t.occurred_at >= ?2) \
           AND (?3 IS NULL OR t.occurred_at < ?3) \
         ORDER BY t.occurred_at DESC"
    ))
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
}
