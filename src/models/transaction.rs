use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Sent,
    Received,
    Redeemed,
}

/// One ledger entry. Transfers carry both parties; the semester allotment
/// has no sender and redemptions have no receiver.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CoinTransaction {
    pub id: i64,
    pub amount: i64,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub reason: String,
    pub sender_id: Option<i64>,
    pub sender_name: Option<String>,
    pub receiver_id: Option<i64>,
    pub receiver_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub student_id: i64,
    pub amount: i64,
    pub reason: String,
}
