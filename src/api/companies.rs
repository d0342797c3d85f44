use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::{AuthUser, hash_password};
use crate::db::{companies, coupons, users};
use crate::error::AppError;
use crate::models::{Company, Coupon, NewCompanyRequest, UpdateCompanyRequest};
use crate::state::AppState;
use crate::validators::validate_cnpj;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", post(create_company))
        .route(
            "/companies/{id}",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/companies/{id}/coupons", get(get_coupons))
}

/// Partner registration, no token required.
async fn create_company(
    State(state): State<AppState>,
    Json(req): Json<NewCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    if !validate_cnpj(&req.cnpj) {
        return Err(AppError::BadRequest("Invalid CNPJ".to_string()));
    }
    if users::email_taken(&state.db, &req.email, None).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if companies::cnpj_taken(&state.db, &req.cnpj).await? {
        return Err(AppError::Conflict("CNPJ already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let company = companies::insert_company(&state.db, &req, &password_hash).await?;

    Ok((StatusCode::CREATED, Json(company)))
}

async fn get_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Company>, AppError> {
    auth.require_self(id)?;
    let company = companies::find_company(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company".to_string()))?;
    Ok(Json(company))
}

async fn update_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCompanyRequest>,
) -> Result<Json<Company>, AppError> {
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

    let company = companies::update_company(&state.db, id, req, password_hash)
        .await?
        .ok_or_else(|| AppError::NotFound("Company".to_string()))?;
    Ok(Json(company))
}

/// Refuses to delete once any of the company's advantages has been
/// redeemed, so coupon history stays intact.
async fn delete_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_self(id)?;

    if coupons::company_coupon_count(&state.db, id).await? > 0 {
        return Err(AppError::Conflict(
            "Company has redeemed coupons and cannot be deleted".to_string(),
        ));
    }

    if companies::delete_company(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Company".to_string()))
    }
}

/// Every coupon issued against this company's advantages.
async fn get_coupons(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Coupon>>, AppError> {
    auth.require_self(id)?;
    let list = coupons::fetch_by_company(&state.db, id).await?;
    Ok(Json(list))
}
