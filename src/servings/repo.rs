use anyhow::Context;
use sqlx::PgPool;

use crate::inventory::ServingLog;

/// Newest first; ties on timestamp fall back to insertion order.
pub async fn list(db: &PgPool, skip: i64, limit: i64) -> anyhow::Result<Vec<ServingLog>> {
    let rows = sqlx::query_as::<_, ServingLog>(
        r#"
        SELECT sl.id,
               sl.meal_id,
               m.name AS meal_name,
               sl.user_id,
               u.name AS user_name,
               sl.portions,
               sl.status,
               sl.failure_reason,
               sl.timestamp
          FROM serving_logs sl
          JOIN meals m ON m.id = sl.meal_id
          JOIN users u ON u.id = sl.user_id
         ORDER BY sl.timestamp DESC, sl.id DESC
         LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(db)
    .await
    .context("list serving logs")?;
    Ok(rows)
}
