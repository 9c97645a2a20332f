use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};

use super::dto::{CreateMealRequest, MealLineInput, UpdateMealRequest};
use super::repo_types::{Meal, MealIngredient};

const MEAL_COLUMNS: &str =
    "id, name, description, category, servings, preparation_time, created_at, updated_at";

pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(&format!("SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find meal")?;
    Ok(meal)
}

pub async fn list(db: &PgPool, skip: i64, limit: i64) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, Meal>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals ORDER BY id ASC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(skip)
    .fetch_all(db)
    .await
    .context("list meals")?;
    Ok(rows)
}

/// Lines of the given meals in line order.
pub async fn lines_for(db: &PgPool, meal_ids: &[i64]) -> anyhow::Result<Vec<MealIngredient>> {
    let rows = sqlx::query_as::<_, MealIngredient>(
        r#"
        SELECT mi.id, mi.meal_id, mi.ingredient_id, i.name AS ingredient_name, mi.quantity, mi.unit
          FROM meal_ingredients mi
          JOIN ingredients i ON i.id = mi.ingredient_id
         WHERE mi.meal_id = ANY($1)
         ORDER BY mi.id ASC
        "#,
    )
    .bind(meal_ids)
    .fetch_all(db)
    .await
    .context("load meal lines")?;
    Ok(rows)
}

pub async fn create(db: &PgPool, req: &CreateMealRequest) -> anyhow::Result<Meal> {
    let mut tx = db.begin().await.context("begin tx")?;
    let meal = sqlx::query_as::<_, Meal>(&format!(
        r#"
        INSERT INTO meals (name, description, category, servings, preparation_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(&req.category)
    .bind(req.servings)
    .bind(req.preparation_time)
    .fetch_one(&mut *tx)
    .await
    .context("insert meal")?;

    insert_lines_tx(&mut tx, meal.id, &req.ingredients).await?;
    tx.commit().await.context("commit tx")?;
    Ok(meal)
}

pub async fn update(
    db: &PgPool,
    id: i64,
    changes: &UpdateMealRequest,
) -> anyhow::Result<Option<Meal>> {
    let mut tx = db.begin().await.context("begin tx")?;
    let Some(meal) = sqlx::query_as::<_, Meal>(&format!(
        r#"
        UPDATE meals
           SET name             = COALESCE($2, name),
               description      = COALESCE($3, description),
               category         = COALESCE($4, category),
               servings         = COALESCE($5, servings),
               preparation_time = COALESCE($6, preparation_time),
               updated_at       = now()
         WHERE id = $1
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.name.as_deref().map(str::trim))
    .bind(changes.description.as_deref())
    .bind(changes.category.as_deref())
    .bind(changes.servings)
    .bind(changes.preparation_time)
    .fetch_optional(&mut *tx)
    .await
    .context("update meal")?
    else {
        return Ok(None);
    };

    if let Some(lines) = &changes.ingredients {
        sqlx::query("DELETE FROM meal_ingredients WHERE meal_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("clear meal lines")?;
        insert_lines_tx(&mut tx, id, lines).await?;
    }

    tx.commit().await.context("commit tx")?;
    Ok(Some(meal))
}

/// Returns whether a row was deleted. Lines go with the meal.
pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM meals WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete meal")?;
    Ok(res.rows_affected() > 0)
}

async fn insert_lines_tx(
    tx: &mut Transaction<'_, Postgres>,
    meal_id: i64,
    lines: &[MealLineInput],
) -> anyhow::Result<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO meal_ingredients (meal_id, ingredient_id, quantity, unit)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(meal_id)
        .bind(line.ingredient_id)
        .bind(line.quantity)
        .bind(line.unit.trim())
        .execute(&mut **tx)
        .await
        .context("insert meal line")?;
    }
    Ok(())
}
