use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest},
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{is_valid_email, normalize_email, verify_password},
    },
    error::AppError,
    state::AppState,
    users::{repo, repo_types::User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/users/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }

    let Some(user) = repo::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::unauthorized("Incorrect username or password"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = user.id, "login invalid password");
        return Err(AppError::unauthorized("Incorrect username or password"));
    }

    if !user.is_active() {
        warn!(user_id = user.id, "login by inactive user");
        return Err(AppError::unauthorized("User is not active"));
    }

    let user = repo::touch_last_login(&state.db, user.id).await?;
    let response = issue_tokens(&state, user)?;
    info!(user_id = response.user.id, email = %response.user.email, "user logged in");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::unauthorized(e.to_string()))?;

    let user = repo::find_by_id(&state.db, claims.sub)
        .await?
        .filter(User::is_active)
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(user))]
pub async fn get_me(user: CurrentUser) -> Json<User> {
    Json(user.0)
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse::bearer(access_token, refresh_token, user))
}
