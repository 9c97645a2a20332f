use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::repo;
use super::repo_types::User;
use super::services;
use crate::{auth::CurrentUser, db, dto::Pagination, error::AppError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
}

#[instrument(skip(state, current, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    current.require_admin()?;
    let user = services::create_user(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, current))]
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<User>>, AppError> {
    current.require_staff_manager()?;
    let (skip, limit) = db::page(p.skip, p.limit);
    Ok(Json(repo::list(&state.db, skip, limit).await?))
}

#[instrument(skip(state, current, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    // Everyone may edit their own profile; only admins touch others or privileges.
    if current.id() != id || payload.touches_privileges() {
        current.require_admin()?;
    }
    let user = services::update_user(&state.db, id, payload).await?;
    info!(user_id = user.id, by = current.id(), "user updated");
    Ok(Json(user))
}

#[instrument(skip(state, current))]
pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    current.require_admin()?;
    if current.id() == id {
        return Err(AppError::bad_request("Cannot delete your own account"));
    }
    services::delete_user(&state.db, id).await?;
    info!(user_id = id, by = current.id(), "user deleted");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
