use anyhow::Context;
use sqlx::PgPool;

use super::dto::SettingsMap;

pub async fn load(db: &PgPool) -> anyhow::Result<SettingsMap> {
    let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM settings")
        .fetch_all(db)
        .await
        .context("load settings")?;
    Ok(rows.into_iter().collect())
}

/// Writes every entry or none.
pub async fn upsert(db: &PgPool, entries: &[(&str, String)]) -> anyhow::Result<()> {
    let mut tx = db.begin().await.context("begin tx")?;
    for (key, value) in entries {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE
               SET value = EXCLUDED.value,
                   updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("upsert setting {key}"))?;
    }
    tx.commit().await.context("commit tx")?;
    Ok(())
}
