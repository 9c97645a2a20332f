use anyhow::Context;
use sqlx::PgPool;

use super::dto::UpdateUserRequest;
use super::repo_types::{User, UserRole};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, status, last_login, created_at, updated_at";

/// Find a user by id.
pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
    Ok(user)
}

/// Find a user by (normalized) email.
pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await
            .context("find user by email")?;
    Ok(user)
}

pub async fn list(db: &PgPool, skip: i64, limit: i64) -> anyhow::Result<Vec<User>> {
    let rows = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(skip)
    .fetch_all(db)
    .await
    .context("list users")?;
    Ok(rows)
}

pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await
        .context("count users")?;
    Ok(n)
}

/// Create a new user with hashed password.
pub async fn create(
    db: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: UserRole,
) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (name, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(db)
    .await
    .context("insert user")?;
    Ok(user)
}

pub async fn update(
    db: &PgPool,
    id: i64,
    changes: &UpdateUserRequest,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
           SET name       = COALESCE($2, name),
               email      = COALESCE($3, email),
               role       = COALESCE($4, role),
               status     = COALESCE($5, status),
               updated_at = now()
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.email.as_deref())
    .bind(changes.role)
    .bind(changes.status.as_deref())
    .fetch_optional(db)
    .await
    .context("update user")?;
    Ok(user)
}

pub async fn touch_last_login(db: &PgPool, id: i64) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET last_login = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .fetch_one(db)
    .await
    .context("update last_login")?;
    Ok(user)
}

/// Returns whether a row was deleted.
pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete user")?;
    Ok(res.rows_affected() > 0)
}
