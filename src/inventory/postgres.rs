use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use tracing::debug;

use super::model::{NewServingLog, Recipe, RecipeLine, ServingLog};
use super::store::{InventoryStore, InventoryTx};

/// Inventory unit of work on a Postgres transaction.
///
/// In locking mode the meal's ingredient rows are taken `FOR UPDATE` (in id
/// order) when the recipe is loaded, so two servings touching the same
/// ingredients run one after the other and the second sees the first's
/// deductions.
pub struct PgInventory {
    tx: Transaction<'static, Postgres>,
    lock_rows: bool,
}

impl PgInventory {
    /// Unit for servings: locks every row it reads.
    pub async fn begin(db: &PgPool) -> anyhow::Result<Self> {
        let tx = db.begin().await.context("begin tx")?;
        Ok(Self { tx, lock_rows: true })
    }

    /// Unit for read-only calculations.
    pub async fn begin_read(db: &PgPool) -> anyhow::Result<Self> {
        let tx = db.begin().await.context("begin tx")?;
        Ok(Self { tx, lock_rows: false })
    }

    pub async fn commit(self) -> anyhow::Result<()> {
        self.tx.commit().await.context("commit tx")
    }
}

#[async_trait]
impl InventoryStore for PgInventory {
    async fn load_recipe(&mut self, meal_id: i64) -> anyhow::Result<Option<Recipe>> {
        let meal_sql = if self.lock_rows {
            "SELECT id, name FROM meals WHERE id = $1 FOR SHARE"
        } else {
            "SELECT id, name FROM meals WHERE id = $1"
        };
        let Some((_, meal_name)) = sqlx::query_as::<_, (i64, String)>(meal_sql)
            .bind(meal_id)
            .fetch_optional(&mut *self.tx)
            .await
            .context("load meal")?
        else {
            return Ok(None);
        };

        if self.lock_rows {
            let locked: Vec<(i64,)> = sqlx::query_as(
                r#"
                SELECT i.id
                  FROM ingredients i
                 WHERE i.id IN (SELECT ingredient_id FROM meal_ingredients WHERE meal_id = $1)
                 ORDER BY i.id
                   FOR UPDATE
                "#,
            )
            .bind(meal_id)
            .fetch_all(&mut *self.tx)
            .await
            .context("lock ingredient rows")?;
            debug!(meal_id, rows = locked.len(), "ingredient rows locked");
        }

        // Read after locking so the quantities reflect the last committed serving.
        let lines = sqlx::query_as::<_, RecipeLine>(
            r#"
            SELECT mi.ingredient_id,
                   i.name          AS ingredient_name,
                   mi.quantity     AS per_portion,
                   mi.unit,
                   i.quantity      AS stock
              FROM meal_ingredients mi
              JOIN ingredients i ON i.id = mi.ingredient_id
             WHERE mi.meal_id = $1
             ORDER BY mi.id ASC
            "#,
        )
        .bind(meal_id)
        .fetch_all(&mut *self.tx)
        .await
        .context("load recipe lines")?;

        Ok(Some(Recipe {
            meal_name,
            lines,
        }))
    }
}

#[async_trait]
impl InventoryTx for PgInventory {
    async fn find_user_name(&mut self, user_id: i64) -> anyhow::Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = $1 FOR SHARE")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await
            .context("load user")?;
        Ok(name)
    }

    async fn deduct_stock(
        &mut self,
        ingredient_id: i64,
        amount: f64,
        at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let res = sqlx::query(
            r#"
            UPDATE ingredients
               SET quantity = quantity - $2,
                   updated_at = $3
             WHERE id = $1
            "#,
        )
        .bind(ingredient_id)
        .bind(amount)
        .bind(at)
        .execute(&mut *self.tx)
        .await
        .with_context(|| format!("deduct stock of ingredient {ingredient_id}"))?;
        anyhow::ensure!(res.rows_affected() == 1, "ingredient {ingredient_id} not found");
        Ok(())
    }

    async fn append_serving_log(
        &mut self,
        log: NewServingLog,
        at: OffsetDateTime,
    ) -> anyhow::Result<ServingLog> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO serving_logs (meal_id, user_id, portions, status, failure_reason, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(log.meal_id)
        .bind(log.user_id)
        .bind(log.portions)
        .bind(log.status)
        .bind(log.failure_reason.as_deref())
        .bind(at)
        .fetch_one(&mut *self.tx)
        .await
        .context("insert serving log")?;

        Ok(ServingLog {
            id,
            meal_id: log.meal_id,
            meal_name: log.meal_name,
            user_id: log.user_id,
            user_name: log.user_name,
            portions: log.portions,
            status: log.status,
            failure_reason: log.failure_reason,
            timestamp: at,
        })
    }
}
