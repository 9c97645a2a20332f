use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use super::dto::{CreateMealRequest, MealDetails, MealLineInput, UpdateMealRequest};
use super::repo;
use super::repo_types::Meal;
use crate::{
    auth::CurrentUser,
    db,
    dto::Pagination,
    error::{db_violation, AppError, DbViolation},
    ingredients,
    inventory::{self, MaxPortions, PgInventory},
    state::AppState,
};

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route(
            "/meals/:id",
            get(get_meal).put(update_meal).delete(delete_meal),
        )
        .route("/meals/:id/max-portions", get(get_max_portions))
}

#[instrument(skip(state, _current))]
pub async fn list_meals(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<MealDetails>>, AppError> {
    let (skip, limit) = db::page(p.skip, p.limit);
    let meals = repo::list(&state.db, skip, limit).await?;
    let ids: Vec<i64> = meals.iter().map(|m| m.id).collect();
    let lines = repo::lines_for(&state.db, &ids).await?;
    Ok(Json(MealDetails::assemble(meals, lines)))
}

#[instrument(skip(state, _current))]
pub async fn get_meal(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MealDetails>, AppError> {
    let meal = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Meal not found"))?;
    Ok(Json(with_lines(&state.db, meal).await?))
}

#[instrument(skip(state, current, payload))]
pub async fn create_meal(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<CreateMealRequest>,
) -> Result<(StatusCode, Json<MealDetails>), AppError> {
    current.require_staff_manager()?;
    payload.validate()?;
    ensure_ingredients_exist(&state.db, &payload.ingredients).await?;

    let meal = repo::create(&state.db, &payload).await?;
    info!(meal_id = meal.id, lines = payload.ingredients.len(), "meal created");
    Ok((StatusCode::CREATED, Json(with_lines(&state.db, meal).await?)))
}

#[instrument(skip(state, current, payload))]
pub async fn update_meal(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMealRequest>,
) -> Result<Json<MealDetails>, AppError> {
    current.require_staff_manager()?;
    payload.validate()?;
    if let Some(lines) = &payload.ingredients {
        ensure_ingredients_exist(&state.db, lines).await?;
    }

    let meal = repo::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Meal not found"))?;
    info!(meal_id = id, lines_replaced = payload.ingredients.is_some(), "meal updated");
    Ok(Json(with_lines(&state.db, meal).await?))
}

#[instrument(skip(state, current))]
pub async fn delete_meal(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    current.require_staff_manager()?;
    match repo::delete(&state.db, id).await {
        Ok(true) => {
            info!(meal_id = id, "meal deleted");
            Ok(Json(json!({ "message": "Meal deleted successfully" })))
        }
        Ok(false) => Err(AppError::not_found("Meal not found")),
        Err(e) if db_violation(&e) == Some(DbViolation::ForeignKey) => {
            warn!(meal_id = id, "meal has serving history");
            Err(AppError::conflict("Meal has recorded servings and cannot be deleted"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Unknown meals report zero portions rather than 404.
#[instrument(skip(state, _current))]
pub async fn get_max_portions(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MaxPortions>, AppError> {
    let mut unit = PgInventory::begin_read(&state.db).await?;
    let result = inventory::max_portions(&mut unit, id).await?;
    unit.commit().await?;
    Ok(Json(result))
}

async fn with_lines(db: &PgPool, meal: Meal) -> anyhow::Result<MealDetails> {
    let ingredients = repo::lines_for(db, &[meal.id]).await?;
    Ok(MealDetails { meal, ingredients })
}

async fn ensure_ingredients_exist(db: &PgPool, lines: &[MealLineInput]) -> Result<(), AppError> {
    let wanted: BTreeSet<i64> = lines.iter().map(|l| l.ingredient_id).collect();
    if wanted.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = wanted.iter().copied().collect();
    let found: BTreeSet<i64> = ingredients::repo::existing_ids(db, &ids)
        .await?
        .into_iter()
        .collect();
    match wanted.difference(&found).next() {
        Some(missing) => Err(AppError::bad_request(format!(
            "Ingredient {missing} does not exist"
        ))),
        None => Ok(()),
    }
}
