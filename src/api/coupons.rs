use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::AuthUser;
use crate::db::{advantages, coupons};
use crate::error::AppError;
use crate::models::{Coupon, Role};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/coupons/{code}", get(get_coupon))
        .route("/coupons/{code}/use", post(use_coupon))
}

/// Looks a coupon up for verification at the counter. Visible to the holder
/// and to the company that issued the advantage.
async fn get_coupon(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(code): Path<String>,
) -> Result<Json<Coupon>, AppError> {
    let coupon = coupons::find_by_code(&state.db, &code)
        .await?
        .ok_or_else(|| AppError::NotFound("Coupon".to_string()))?;

    authorize_coupon_access(&state, &auth, &coupon).await?;
    Ok(Json(coupon))
}

/// Marks the coupon as used. Only the issuing company may redeem it, and
/// only once.
async fn use_coupon(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(code): Path<String>,
) -> Result<Json<Coupon>, AppError> {
    auth.require_role(Role::Company)?;

    let coupon = coupons::find_by_code(&state.db, &code)
        .await?
        .ok_or_else(|| AppError::NotFound("Coupon".to_string()))?;
    authorize_coupon_access(&state, &auth, &coupon).await?;

    if !coupons::mark_used(&state.db, &code).await? {
        return Err(AppError::BadRequest("Coupon already used".to_string()));
    }

    let coupon = coupons::find_by_code(&state.db, &code)
        .await?
        .ok_or(AppError::InternalServerError)?;
    Ok(Json(coupon))
}

async fn authorize_coupon_access(
    state: &AppState,
    auth: &AuthUser,
    coupon: &Coupon,
) -> Result<(), AppError> {
    match auth.role {
        Role::Student if auth.id == coupon.student_id => Ok(()),
        Role::Company => {
            let advantage = advantages::find_advantage(&state.db, coupon.advantage_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Advantage".to_string()))?;
            if advantage.company_id == auth.id {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "Coupon belongs to another company".to_string(),
                ))
            }
        }
        _ => Err(AppError::Forbidden(
            "Not allowed to view this coupon".to_string(),
        )),
    }
}
