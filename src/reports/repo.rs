use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;

/// `(successful portions, successful attempts, all attempts)` within `[start, end]`.
pub async fn usage_totals(
    db: &PgPool,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> anyhow::Result<(i64, i64, i64)> {
    let row = sqlx::query_as::<_, (i64, i64, i64)>(
        r#"
        SELECT COALESCE(SUM(portions) FILTER (WHERE status = 'success'), 0)::BIGINT,
               COUNT(*) FILTER (WHERE status = 'success'),
               COUNT(*)
          FROM serving_logs
         WHERE timestamp >= $1 AND timestamp <= $2
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await
    .context("usage totals")?;
    Ok(row)
}
