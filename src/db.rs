use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

pub async fn migrate(db: &PgPool) {
    // Run migrations if present
    if let Err(e) = sqlx::migrate!("./migrations").run(db).await {
        tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
    }
}

/// Clamp client supplied `skip`/`limit` the way every list endpoint expects.
pub fn page(skip: i64, limit: i64) -> (i64, i64) {
    (skip.max(0), limit.clamp(1, 500))
}

#[cfg(test)]
mod tests {
    use super::page;

    #[test]
    fn page_clamps_negative_and_oversized_values() {
        assert_eq!(page(-5, 0), (0, 1));
        assert_eq!(page(10, 100), (10, 100));
        assert_eq!(page(0, 10_000), (0, 500));
    }
}
