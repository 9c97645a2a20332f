use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use time::{OffsetDateTime, Time};
use tracing::{debug, instrument};

use super::dto::{DashboardStats, IngredientUsage, MealPopularity, WasteEntry, WindowQuery};
use super::{repo, services};
use crate::{auth::CurrentUser, error::AppError, state::AppState};

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/dashboard", get(dashboard))
        .route("/analytics/ingredient-usage", get(ingredient_usage))
        .route("/analytics/meal-popularity", get(meal_popularity))
        .route("/analytics/waste-analysis", get(waste_analysis))
}

#[instrument(skip(state, _current))]
pub async fn dashboard(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<DashboardStats>, AppError> {
    let midnight = OffsetDateTime::now_utc().replace_time(Time::MIDNIGHT);
    let (total_ingredients, low_stock_items, meals_served_today, value) =
        repo::dashboard_counts(&state.db, midnight).await?;
    debug!(total_ingredients, low_stock_items, meals_served_today, "dashboard computed");
    Ok(Json(DashboardStats {
        total_ingredients,
        low_stock_items,
        meals_served_today,
        inventory_value: services::round_to(value, 2),
    }))
}

#[instrument(skip(state, _current))]
pub async fn ingredient_usage(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(q): Query<WindowQuery>,
) -> Result<Json<Vec<IngredientUsage>>, AppError> {
    let since = q.since(OffsetDateTime::now_utc())?;
    Ok(Json(repo::ingredient_usage(&state.db, since).await?))
}

#[instrument(skip(state, _current))]
pub async fn meal_popularity(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(q): Query<WindowQuery>,
) -> Result<Json<Vec<MealPopularity>>, AppError> {
    let since = q.since(OffsetDateTime::now_utc())?;
    let rows = repo::portions_by_meal(&state.db, since).await?;
    Ok(Json(services::meal_popularity(rows)))
}

#[instrument(skip(state, _current))]
pub async fn waste_analysis(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(q): Query<WindowQuery>,
) -> Result<Json<Vec<WasteEntry>>, AppError> {
    let since = q.since(OffsetDateTime::now_utc())?;
    let rows = repo::surplus_by_ingredient(&state.db, since).await?;
    Ok(Json(services::waste_analysis(rows)))
}
