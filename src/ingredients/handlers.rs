use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::dto::{CreateIngredientRequest, UpdateIngredientRequest};
use super::repo;
use super::repo_types::Ingredient;
use crate::{
    auth::CurrentUser,
    db,
    dto::Pagination,
    error::{db_violation, AppError, DbViolation},
    notify::Event,
    state::AppState,
};

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients).post(create_ingredient))
        .route(
            "/ingredients/:id",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
}

#[instrument(skip(state, current, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<Ingredient>), AppError> {
    current.require_staff_manager()?;
    payload.validate()?;
    let ingredient = repo::create(&state.db, &payload).await?;
    info!(ingredient_id = ingredient.id, name = %ingredient.name, "ingredient created");
    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[instrument(skip(state, _current))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Ingredient>>, AppError> {
    let (skip, limit) = db::page(p.skip, p.limit);
    Ok(Json(repo::list(&state.db, skip, limit).await?))
}

#[instrument(skip(state, _current))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Ingredient>, AppError> {
    repo::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Ingredient not found"))
}

#[instrument(skip(state, current, payload))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateIngredientRequest>,
) -> Result<Json<Ingredient>, AppError> {
    current.require_staff_manager()?;
    payload.validate()?;
    let ingredient = repo::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Ingredient not found"))?;

    info!(ingredient_id = id, quantity = ingredient.quantity, "ingredient updated");
    state
        .notifier
        .publish(&Event::IngredientUpdated(ingredient.clone()));
    Ok(Json(ingredient))
}

#[instrument(skip(state, current))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    current.require_staff_manager()?;
    match repo::delete(&state.db, id).await {
        Ok(true) => {
            info!(ingredient_id = id, "ingredient deleted");
            Ok(Json(json!({ "message": "Ingredient deleted successfully" })))
        }
        Ok(false) => Err(AppError::not_found("Ingredient not found")),
        Err(e) if db_violation(&e) == Some(DbViolation::ForeignKey) => {
            warn!(ingredient_id = id, "ingredient still used by meals");
            Err(AppError::conflict("Ingredient is used by one or more meals"))
        }
        Err(e) => Err(e.into()),
    }
}
