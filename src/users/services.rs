use sqlx::PgPool;
use tracing::{info, warn};

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::repo;
use super::repo_types::{User, UserRole, STATUS_ACTIVE};
use crate::auth::password::{hash_password, is_valid_email, normalize_email, MIN_PASSWORD_LEN};
use crate::config::BootstrapAdmin;
use crate::error::{db_violation, AppError, DbViolation};

const KNOWN_STATUSES: [&str; 2] = [STATUS_ACTIVE, "inactive"];

pub async fn create_user(db: &PgPool, mut req: CreateUserRequest) -> Result<User, AppError> {
    req.email = normalize_email(&req.email);
    req.name = req.name.trim().to_string();

    if req.name.is_empty() {
        return Err(AppError::bad_request("Name must not be empty"));
    }
    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("Password too short"));
    }
    if repo::find_by_email(db, &req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::conflict("Email already registered"));
    }

    let hash = hash_password(&req.password)?;
    let user = repo::create(db, &req.name, &req.email, &hash, req.role)
        .await
        .map_err(email_conflict)?;
    info!(user_id = user.id, role = ?user.role, "user created");
    Ok(user)
}

pub async fn update_user(
    db: &PgPool,
    id: i64,
    mut changes: UpdateUserRequest,
) -> Result<User, AppError> {
    if let Some(email) = changes.email.as_mut() {
        *email = normalize_email(email);
        if !is_valid_email(email) {
            return Err(AppError::bad_request("Invalid email"));
        }
    }
    if let Some(status) = changes.status.as_deref() {
        if !KNOWN_STATUSES.contains(&status) {
            return Err(AppError::bad_request(format!("Unknown status '{status}'")));
        }
    }

    repo::update(db, id, &changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn delete_user(db: &PgPool, id: i64) -> Result<(), AppError> {
    match repo::delete(db, id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::not_found("User not found")),
        Err(e) if db_violation(&e) == Some(DbViolation::ForeignKey) => Err(AppError::conflict(
            "User has recorded servings; deactivate the account instead",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Seed the first admin when the users table is empty.
pub async fn ensure_bootstrap_admin(db: &PgPool, admin: Option<&BootstrapAdmin>) -> anyhow::Result<()> {
    let Some(admin) = admin else {
        return Ok(());
    };
    if repo::count(db).await? > 0 {
        return Ok(());
    }

    let email = normalize_email(&admin.email);
    anyhow::ensure!(is_valid_email(&email), "BOOTSTRAP_ADMIN_EMAIL is not a valid email");
    anyhow::ensure!(
        admin.password.len() >= MIN_PASSWORD_LEN,
        "BOOTSTRAP_ADMIN_PASSWORD is too short"
    );

    let hash = hash_password(&admin.password)?;
    let user = repo::create(db, &admin.name, &email, &hash, UserRole::Admin).await?;
    info!(user_id = user.id, email = %user.email, "bootstrap admin created");
    Ok(())
}

fn email_conflict(e: anyhow::Error) -> AppError {
    if db_violation(&e) == Some(DbViolation::Unique) {
        AppError::conflict("Email already registered")
    } else {
        e.into()
    }
}
