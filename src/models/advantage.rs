use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog item published by a company. `available_quantity` of NULL means
/// unlimited stock; 0 means sold out and hidden from the student catalog.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Advantage {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cost_in_coins: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<i64>,
    pub photo: Option<String>,
    pub company_id: i64,
    pub company_name: String,
    pub times_redeemed: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdvantageRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost_in_coins: i64,
    pub available_quantity: Option<i64>,
    pub photo: Option<String>,
    pub company_id: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdvantageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost_in_coins: Option<i64>,
    pub available_quantity: Option<Option<i64>>,
    /// `"photo": null` clears a stale image, an absent field keeps it.
    pub photo: Option<Option<String>>,
}
