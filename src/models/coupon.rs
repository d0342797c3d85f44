use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{Advantage, Student};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub used: bool,
    pub generated_at: DateTime<Utc>,
    pub advantage_id: i64,
    pub advantage_name: String,
    pub student_id: i64,
    pub student_name: String,
    pub company_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub advantage_id: i64,
    pub student_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub code: String,
    pub advantage: Advantage,
    pub student: Student,
    pub purchase_date: DateTime<Utc>,
}
