use async_trait::async_trait;
use time::OffsetDateTime;

use super::model::{NewServingLog, Recipe, ServingLog};

/// Read side of a unit of work over the inventory tables.
#[async_trait]
pub trait InventoryStore: Send {
    /// Meal with its lines and current ingredient stock, `None` if the meal is absent.
    async fn load_recipe(&mut self, meal_id: i64) -> anyhow::Result<Option<Recipe>>;
}

/// A unit of work that may mutate stock and append serving logs.
///
/// Nothing written through it is visible until the owner commits; dropping
/// the unit discards every write.
#[async_trait]
pub trait InventoryTx: InventoryStore {
    async fn find_user_name(&mut self, user_id: i64) -> anyhow::Result<Option<String>>;

    async fn deduct_stock(
        &mut self,
        ingredient_id: i64,
        amount: f64,
        at: OffsetDateTime,
    ) -> anyhow::Result<()>;

    async fn append_serving_log(
        &mut self,
        log: NewServingLog,
        at: OffsetDateTime,
    ) -> anyhow::Result<ServingLog>;
}
