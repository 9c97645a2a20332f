use anyhow::Context;
use sqlx::PgPool;

use super::dto::{CreateIngredientRequest, UpdateIngredientRequest};
use super::repo_types::Ingredient;

const INGREDIENT_COLUMNS: &str = "id, name, quantity, unit, threshold, category, cost, \
     delivery_date, created_at, updated_at, (quantity <= threshold) AS low_stock";

pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find ingredient")?;
    Ok(row)
}

pub async fn list(db: &PgPool, skip: i64, limit: i64) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM ingredients ORDER BY id ASC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(skip)
    .fetch_all(db)
    .await
    .context("list ingredients")?;
    Ok(rows)
}

/// Every ingredient, for reports.
pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM ingredients ORDER BY name ASC, id ASC"
    ))
    .fetch_all(db)
    .await
    .context("list all ingredients")?;
    Ok(rows)
}

/// Ids among `ids` that exist.
pub async fn existing_ids(db: &PgPool, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
    let rows = sqlx::query_scalar::<_, i64>("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await
        .context("check ingredient ids")?;
    Ok(rows)
}

pub async fn create(db: &PgPool, req: &CreateIngredientRequest) -> anyhow::Result<Ingredient> {
    let row = sqlx::query_as::<_, Ingredient>(&format!(
        r#"
        INSERT INTO ingredients (name, quantity, unit, threshold, category, cost, delivery_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {INGREDIENT_COLUMNS}
        "#
    ))
    .bind(req.name.trim())
    .bind(req.quantity)
    .bind(req.unit.trim())
    .bind(req.threshold)
    .bind(&req.category)
    .bind(req.cost)
    .bind(req.delivery_date)
    .fetch_one(db)
    .await
    .context("insert ingredient")?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: i64,
    changes: &UpdateIngredientRequest,
) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(&format!(
        r#"
        UPDATE ingredients
           SET name          = COALESCE($2, name),
               quantity      = COALESCE($3, quantity),
               unit          = COALESCE($4, unit),
               threshold     = COALESCE($5, threshold),
               category      = COALESCE($6, category),
               cost          = COALESCE($7, cost),
               delivery_date = COALESCE($8, delivery_date),
               updated_at    = now()
         WHERE id = $1
        RETURNING {INGREDIENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.name.as_deref().map(str::trim))
    .bind(changes.quantity)
    .bind(changes.unit.as_deref().map(str::trim))
    .bind(changes.threshold)
    .bind(changes.category.as_deref())
    .bind(changes.cost)
    .bind(changes.delivery_date)
    .fetch_optional(db)
    .await
    .context("update ingredient")?;
    Ok(row)
}

/// Returns whether a row was deleted.
pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete ingredient")?;
    Ok(res.rows_affected() > 0)
}
