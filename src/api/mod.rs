use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::error::AppError;
use crate::state::AppState;

pub mod advantages;
pub mod auth;
pub mod companies;
pub mod coupons;
pub mod institutions;
pub mod students;
pub mod teachers;
pub mod upload;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(institutions::routes())
        .merge(students::routes())
        .merge(teachers::routes())
        .merge(companies::routes())
        .merge(advantages::routes())
        .merge(coupons::routes())
        .merge(upload::routes())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}
