use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::students::DateRangeParams;
use crate::auth::{AuthUser, hash_password};
use crate::db::{students, teachers, transactions, users};
use crate::error::AppError;
use crate::models::{
    BalanceResponse, CoinTransaction, Role, Student, Teacher, TransferRequest,
    UpdateTeacherRequest,
};
use crate::services::LedgerService;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/teachers/{id}", get(get_teacher).put(update_teacher))
        .route("/teachers/{id}/balance", get(get_balance))
        .route("/teachers/{id}/transactions", get(get_transactions))
        .route("/teachers/{id}/students", get(get_institution_students))
        .route("/teachers/{id}/transfer", post(transfer))
}

async fn get_teacher(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Teacher>, AppError> {
    auth.require_self(id)?;
    let teacher = teachers::find_teacher(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher".to_string()))?;
    Ok(Json(teacher))
}

async fn update_teacher(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTeacherRequest>,
) -> Result<Json<Teacher>, AppError> {
    auth.require_self(id)?;

    if let Some(email) = &req.email {
        if users::email_taken(&state.db, email, Some(id)).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
    }

    let password_hash = match &req.password {
        Some(plain) => Some(hash_password(plain)?),
        None => None,
    };

    let teacher = teachers::update_teacher(&state.db, id, req, password_hash)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher".to_string()))?;
    Ok(Json(teacher))
}

async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<BalanceResponse>, AppError> {
    auth.require_self(id)?;
    let teacher = teachers::find_teacher(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher".to_string()))?;
    Ok(Json(BalanceResponse {
        balance: teacher.balance,
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

/// Transfer candidates: students enrolled at the teacher's institution.
async fn get_institution_students(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Student>>, AppError> {
    auth.require_self(id)?;
    let teacher = teachers::find_teacher(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher".to_string()))?;
    let list = students::fetch_students_by_institution(&state.db, teacher.institution_id).await?;
    Ok(Json(list))
}

async fn transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<CoinTransaction>), AppError> {
    auth.require_role(Role::Teacher)?;
    auth.require_self(id)?;

    let ledger = LedgerService::new(state.db.clone(), Arc::clone(&state.notifier));
    let transaction = ledger.transfer(id, req).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}
