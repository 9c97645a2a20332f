use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::dto::IngredientUsage;

/// `(total ingredients, low stock, successful portions since, inventory value)`.
pub async fn dashboard_counts(
    db: &PgPool,
    served_since: OffsetDateTime,
) -> anyhow::Result<(i64, i64, i64, f64)> {
    let row = sqlx::query_as::<_, (i64, i64, i64, f64)>(
        r#"
        SELECT (SELECT COUNT(*) FROM ingredients),
               (SELECT COUNT(*) FROM ingredients WHERE quantity <= threshold),
               (SELECT COALESCE(SUM(portions), 0)::BIGINT
                  FROM serving_logs
                 WHERE status = 'success' AND timestamp >= $1),
               (SELECT COALESCE(SUM(quantity * cost), 0)::DOUBLE PRECISION FROM ingredients)
        "#,
    )
    .bind(served_since)
    .fetch_one(db)
    .await
    .context("dashboard counts")?;
    Ok(row)
}

/// Stock consumed by successful servings, computed from the current recipes.
pub async fn ingredient_usage(
    db: &PgPool,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<IngredientUsage>> {
    let rows = sqlx::query_as::<_, IngredientUsage>(
        r#"
        SELECT i.name,
               SUM(mi.quantity * sl.portions)::DOUBLE PRECISION AS total_used
          FROM serving_logs sl
          JOIN meal_ingredients mi ON mi.meal_id = sl.meal_id
          JOIN ingredients i ON i.id = mi.ingredient_id
         WHERE sl.status = 'success' AND sl.timestamp >= $1
         GROUP BY i.name
         ORDER BY total_used DESC, i.name
        "#,
    )
    .bind(since)
    .fetch_all(db)
    .await
    .context("ingredient usage")?;
    Ok(rows)
}

pub async fn portions_by_meal(
    db: &PgPool,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT m.name, SUM(sl.portions)::BIGINT AS portions
          FROM serving_logs sl
          JOIN meals m ON m.id = sl.meal_id
         WHERE sl.status = 'success' AND sl.timestamp >= $1
         GROUP BY m.name
         ORDER BY portions DESC, m.name
        "#,
    )
    .bind(since)
    .fetch_all(db)
    .await
    .context("portions by meal")?;
    Ok(rows)
}

pub async fn surplus_by_ingredient(
    db: &PgPool,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<(String, f64)>> {
    let rows = sqlx::query_as::<_, (String, f64)>(
        r#"
        SELECT name, SUM(quantity - threshold)::DOUBLE PRECISION AS wasted
          FROM ingredients
         WHERE quantity > threshold AND updated_at >= $1
         GROUP BY name
         ORDER BY wasted DESC, name
        "#,
    )
    .bind(since)
    .fetch_all(db)
    .await
    .context("surplus by ingredient")?;
    Ok(rows)
}
