use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db::advantages;
use crate::error::AppError;
use crate::models::{Advantage, NewAdvantageRequest, Role, UpdateAdvantageRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReactivateParams {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyViewParams {
    pub show_quantity: Option<bool>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/advantages", get(list_catalog).post(create_advantage))
        .route(
            "/advantages/{id}",
            get(get_advantage)
                .put(update_advantage)
                .delete(delete_advantage),
        )
        .route("/advantages/company/{id}", get(list_company_advantages))
        .route("/advantages/{id}/reactivate", patch(reactivate))
}

/// The student-facing catalog. Sold-out items are excluded.
async fn list_catalog(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<Advantage>>, AppError> {
    let catalog = advantages::fetch_catalog(&state.db).await?;
    Ok(Json(catalog))
}

async fn get_advantage(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Advantage>, AppError> {
    let advantage = advantages::find_advantage(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Advantage".to_string()))?;
    Ok(Json(advantage))
}

/// Owner view, including sold-out items. `showQuantity=false` leaves the
/// stock level out of the response.
async fn list_company_advantages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<CompanyViewParams>,
) -> Result<Json<Vec<Advantage>>, AppError> {
    auth.require_role(Role::Company)?;
    auth.require_self(id)?;

    let mut list = advantages::fetch_by_company(&state.db, id).await?;
    if params.show_quantity == Some(false) {
        for advantage in &mut list {
            advantage.available_quantity = None;
        }
    }
    Ok(Json(list))
}

async fn create_advantage(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewAdvantageRequest>,
) -> Result<(StatusCode, Json<Advantage>), AppError> {
    auth.require_role(Role::Company)?;
    auth.require_self(req.company_id)?;

    if req.cost_in_coins <= 0 {
        return Err(AppError::BadRequest("Cost must be positive".to_string()));
    }
    if matches!(req.available_quantity, Some(q) if q < 0) {
        return Err(AppError::BadRequest(
            "Quantity must not be negative".to_string(),
        ));
    }

    let advantage = advantages::insert_advantage(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(advantage)))
}

async fn update_advantage(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAdvantageRequest>,
) -> Result<Json<Advantage>, AppError> {
    auth.require_role(Role::Company)?;
    let current = advantages::find_advantage(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Advantage".to_string()))?;
    auth.require_self(current.company_id)?;

    if matches!(req.cost_in_coins, Some(c) if c <= 0) {
        return Err(AppError::BadRequest("Cost must be positive".to_string()));
    }
    if matches!(req.available_quantity, Some(Some(q)) if q < 0) {
        return Err(AppError::BadRequest(
            "Quantity must not be negative".to_string(),
        ));
    }

    let advantage = advantages::update_advantage(&state.db, id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("Advantage".to_string()))?;
    Ok(Json(advantage))
}

/// Refuses to delete once coupons exist, so redemption history stays intact.
async fn delete_advantage(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_role(Role::Company)?;
    let current = advantages::find_advantage(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Advantage".to_string()))?;
    auth.require_self(current.company_id)?;

    if advantages::coupon_count(&state.db, id).await? > 0 {
        return Err(AppError::Conflict(
            "Advantage has redeemed coupons and cannot be deleted".to_string(),
        ));
    }

    if advantages::delete_advantage(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Advantage".to_string()))
    }
}

/// Restocks a sold-out advantage so it reappears in the catalog.
async fn reactivate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<ReactivateParams>,
) -> Result<Json<Advantage>, AppError> {
    auth.require_role(Role::Company)?;
    let current = advantages::find_advantage(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Advantage".to_string()))?;
    auth.require_self(current.company_id)?;

    if params.quantity <= 0 {
        return Err(AppError::BadRequest(
            "Quantity must be positive".to_string(),
        ));
    }

    let advantage = advantages::reactivate_advantage(&state.db, id, params.quantity)
        .await?
        .ok_or_else(|| AppError::NotFound("Advantage".to_string()))?;
    Ok(Json(advantage))
}
