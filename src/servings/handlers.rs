use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::ServeRequest;
use super::repo;
use crate::{
    auth::CurrentUser,
    db,
    dto::Pagination,
    error::AppError,
    inventory::{serve_meal, PgInventory, ServingLog, ServingStatus},
    notify::Event,
    state::AppState,
};

pub fn serving_routes() -> Router<AppState> {
    Router::new().route("/servings", get(list_servings).post(create_serving))
}

/// Serves a meal as the current user. A stock shortfall is not an HTTP error:
/// the failed attempt is logged and returned like a successful one.
#[instrument(skip(state, current), fields(user_id = current.id()))]
pub async fn create_serving(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<ServeRequest>,
) -> Result<(StatusCode, Json<ServingLog>), AppError> {
    let mut unit = PgInventory::begin(&state.db).await?;
    let log = serve_meal(&mut unit, payload.meal_id, payload.portions, current.id()).await?;
    unit.commit().await?;

    match log.status {
        ServingStatus::Success => info!(
            log_id = log.id,
            meal_id = log.meal_id,
            portions = log.portions,
            "meal served"
        ),
        ServingStatus::Failed => warn!(
            log_id = log.id,
            meal_id = log.meal_id,
            reason = log.failure_reason.as_deref().unwrap_or_default(),
            "serving refused"
        ),
    }

    state.notifier.publish(&Event::MealServed(log.clone()));
    Ok((StatusCode::CREATED, Json(log)))
}

#[instrument(skip(state, _current))]
pub async fn list_servings(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<ServingLog>>, AppError> {
    let (skip, limit) = db::page(p.skip, p.limit);
    Ok(Json(repo::list(&state.db, skip, limit).await?))
}
