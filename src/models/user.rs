use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    Student,
    Teacher,
    Company,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub rg: String,
    pub address: String,
    pub course: String,
    pub balance: i64,
    pub institution_id: i64,
    pub institution_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudentRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub cpf: String,
    pub rg: String,
    pub address: String,
    pub course: String,
    pub institution_id: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub rg: Option<String>,
    pub address: Option<String>,
    pub course: Option<String>,
    pub institution_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub department: String,
    pub balance: i64,
    pub institution_id: i64,
    pub institution_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_credit_period: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeacherRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub cnpj: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompanyRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub cnpj: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub balance: i64,
}
