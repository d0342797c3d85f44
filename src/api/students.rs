use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::{AuthUser, hash_password};
use crate::db::{coupons, institutions, students, transactions, users};
use crate::error::AppError;
use crate::models::{
    BalanceResponse, CoinTransaction, Coupon, NewStudentRequest, PurchaseRequest, PurchaseResponse,
    Role, Student, UpdateStudentRequest,
};
use crate::services::LedgerService;
use crate::state::AppState;
use crate::validators::{validate_cpf, validate_rg};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/students/{id}/balance", get(get_balance))
        .route("/students/{id}/transactions", get(get_transactions))
        .route("/students/{id}/coupons", get(get_coupons))
        .route("/students/purchase", post(purchase))
}

async fn list_students(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Student>>, AppError> {
    auth.require_role(Role::Teacher)?;
    let list = students::fetch_students(&state.db).await?;
    Ok(Json(list))
}

/// Self-service registration, no token required.
async fn create_student(
    State(state): State<AppState>,
    Json(req): Json<NewStudentRequest>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    if !validate_cpf(&req.cpf) {
        return Err(AppError::BadRequest("Invalid CPF".to_string()));
    }
    if !validate_rg(&req.rg) {
        return Err(AppError::BadRequest("Invalid RG".to_string()));
    }
    if !institutions::institution_exists(&state.db, req.institution_id).await? {
        return Err(AppError::NotFound("Institution".to_string()));
    }
    if users::email_taken(&state.db, &req.email, None).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if students::cpf_taken(&state.db, &req.cpf).await? {
        return Err(AppError::Conflict("CPF already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let student = students::insert_student(&state.db, &req, &password_hash).await?;

    Ok((StatusCode::CREATED, Json(student)))
}

async fn get_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Student>, AppError> {
    // Teachers may look students up to pick a transfer target.
    if auth.role != Role::Teacher {
        auth.require_self(id)?;
    }
    let student = students::find_student(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    Ok(Json(student))
}

async fn update_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStudentRequest>,
) -> Result<Json<Student>, AppError> {
    auth.require_self(id)?;

    if let Some(rg) = &req.rg {
        if !validate_rg(rg) {
            return Err(AppError::BadRequest("Invalid RG".to_string()));
        }
    }
    if let Some(email) = &req.email {
        if users::email_taken(&state.db, email, Some(id)).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
    }
    if let Some(institution_id) = req.institution_id {
        if !institutions::institution_exists(&state.db, institution_id).await? {
            return Err(AppError::NotFound("Institution".to_string()));
        }
    }

    let password_hash = match &req.password {
        Some(plain) => Some(hash_password(plain)?),
        None => None,
    };

    let student = students::update_student(&state.db, id, req, password_hash)
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    Ok(Json(student))
}

async fn delete_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_self(id)?;

    if students::delete_student(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Student".to_string()))
    }
}

async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<BalanceResponse>, AppError> {
    auth.require_self(id)?;
    let student = students::find_student(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    Ok(Json(BalanceResponse {
        balance: student.balance,
    }))
}

async fn get_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<Vec<CoinTransaction>>, AppError> {
    auth.require_self(id)?;
    let history =
        transactions::fetch_user_transactions(&state.db, id, params.start_date, params.end_date)
            .await?;
    Ok(Json(history))
}

async fn get_coupons(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Coupon>>, AppError> {
    auth.require_self(id)?;
    let list = coupons::fetch_by_student(&state.db, id).await?;
    Ok(Json(list))
}

async fn purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    auth.require_role(Role::Student)?;
    auth.require_self(req.student_id)?;

    let ledger = LedgerService::new(state.db.clone(), Arc::clone(&state.notifier));
    let receipt = ledger.redeem(req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
