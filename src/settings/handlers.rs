use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument};

use super::dto::{SettingsMap, SettingsUpdate};
use super::repo;
use crate::{auth::CurrentUser, error::AppError, state::AppState};

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

#[instrument(skip(state, current))]
pub async fn get_settings(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<SettingsMap>, AppError> {
    current.require_staff_manager()?;
    Ok(Json(repo::load(&state.db).await?))
}

#[instrument(skip(state, current, payload))]
pub async fn update_settings(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<SettingsUpdate>,
) -> Result<Json<SettingsMap>, AppError> {
    current.require_admin()?;
    payload.validate()?;
    let entries = payload.entries();
    repo::upsert(&state.db, &entries).await?;
    info!(
        user_id = current.id(),
        keys = ?entries.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
        "settings updated"
    );
    Ok(Json(repo::load(&state.db).await?))
}
