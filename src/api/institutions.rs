use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::db::institutions;
use crate::error::AppError;
use crate::models::Institution;
use crate::state::AppState;

/// Public, so the registration form can offer institutions and courses.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/institutions", get(list_institutions))
        .route("/institutions/{id}", get(get_institution))
}

async fn list_institutions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Institution>>, AppError> {
    let list = institutions::fetch_institutions(&state.db).await?;
    Ok(Json(list))
}

async fn get_institution(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Institution>, AppError> {
    let institution = institutions::find_institution(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Institution".to_string()))?;
    Ok(Json(institution))
}
