//! In-memory inventory used by the core's tests.
//!
//! A unit of work holds the store lock for its whole lifetime, so units are
//! serialised the same way row locks serialise them in Postgres.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::model::{NewServingLog, Recipe, RecipeLine, ServingLog};
use super::store::{InventoryStore, InventoryTx};

#[derive(Debug, Clone)]
pub struct StockItem {
    pub name: String,
    pub quantity: f64,
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct LineRow {
    pub id: i64,
    pub meal_id: i64,
    pub ingredient_id: i64,
    pub per_portion: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub meals: BTreeMap<i64, String>,
    pub ingredients: BTreeMap<i64, StockItem>,
    pub lines: Vec<LineRow>,
    pub users: BTreeMap<i64, String>,
    pub logs: Vec<ServingLog>,
    pub fail_log_writes: bool,
}

impl Snapshot {
    pub const SOUP: i64 = 1;
    pub const WATER: i64 = 2;
    pub const CARROT: i64 = 10;
    pub const SALT: i64 = 11;
    pub const COOK: i64 = 100;

    /// Soup needs 2 Carrot and 1 Salt per portion; Carrot=10, Salt=3.
    /// Water has no lines.
    pub fn soup() -> Self {
        let mut s = Snapshot::default();
        s.add_ingredient(Self::CARROT, "Carrot", 10.0);
        s.add_ingredient(Self::SALT, "Salt", 3.0);
        s.meals.insert(Self::SOUP, "Soup".into());
        s.meals.insert(Self::WATER, "Water".into());
        s.add_line(Self::SOUP, Self::CARROT, 2.0, "kg");
        s.add_line(Self::SOUP, Self::SALT, 1.0, "kg");
        s.users.insert(Self::COOK, "Cook".into());
        s
    }

    pub fn add_ingredient(&mut self, id: i64, name: &str, quantity: f64) {
        self.ingredients.insert(
            id,
            StockItem {
                name: name.into(),
                quantity,
                updated_at: None,
            },
        );
    }

    pub fn add_line(&mut self, meal_id: i64, ingredient_id: i64, per_portion: f64, unit: &str) {
        let id = self.lines.len() as i64 + 1;
        self.lines.push(LineRow {
            id,
            meal_id,
            ingredient_id,
            per_portion,
            unit: unit.into(),
        });
    }

    pub fn ingredient(&self, id: i64) -> &StockItem {
        &self.ingredients[&id]
    }

    pub fn stock(&self, id: i64) -> f64 {
        self.ingredient(id).quantity
    }
}

#[derive(Debug, Clone)]
pub struct MemoryInventory {
    inner: Arc<Mutex<Snapshot>>,
}

impl MemoryInventory {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(snapshot)),
        }
    }

    pub async fn begin(&self) -> MemoryTx {
        let guard = self.inner.clone().lock_owned().await;
        let staged = guard.clone();
        MemoryTx { guard, staged }
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.lock().await.clone()
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Snapshot>,
    staged: Snapshot,
}

impl MemoryTx {
    pub fn commit(mut self) {
        *self.guard = self.staged;
    }
}

#[async_trait]
impl InventoryStore for MemoryTx {
    async fn load_recipe(&mut self, meal_id: i64) -> anyhow::Result<Option<Recipe>> {
        let Some(meal_name) = self.staged.meals.get(&meal_id) else {
            return Ok(None);
        };
        let mut lines = Vec::new();
        for row in self.staged.lines.iter().filter(|l| l.meal_id == meal_id) {
            let item = self
                .staged
                .ingredients
                .get(&row.ingredient_id)
                .ok_or_else(|| anyhow::anyhow!("line {} references missing ingredient", row.id))?;
            lines.push(RecipeLine {
                ingredient_id: row.ingredient_id,
                ingredient_name: item.name.clone(),
                per_portion: row.per_portion,
                unit: row.unit.clone(),
                stock: item.quantity,
            });
        }
        Ok(Some(Recipe {
            meal_name: meal_name.clone(),
            lines,
        }))
    }
}

#[async_trait]
impl InventoryTx for MemoryTx {
    async fn find_user_name(&mut self, user_id: i64) -> anyhow::Result<Option<String>> {
        Ok(self.staged.users.get(&user_id).cloned())
    }

    async fn deduct_stock(
        &mut self,
        ingredient_id: i64,
        amount: f64,
        at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let item = self
            .staged
            .ingredients
            .get_mut(&ingredient_id)
            .ok_or_else(|| anyhow::anyhow!("ingredient {ingredient_id} vanished"))?;
        anyhow::ensure!(item.quantity >= amount, "stock of {} would go negative", item.name);
        item.quantity -= amount;
        item.updated_at = Some(at);
        Ok(())
    }

    async fn append_serving_log(
        &mut self,
        log: NewServingLog,
        at: OffsetDateTime,
    ) -> anyhow::Result<ServingLog> {
        anyhow::ensure!(!self.staged.fail_log_writes, "serving_logs write failed");
        let record = ServingLog {
            id: self.staged.logs.len() as i64 + 1,
            meal_id: log.meal_id,
            meal_name: log.meal_name,
            user_id: log.user_id,
            user_name: log.user_name,
            portions: log.portions,
            status: log.status,
            failure_reason: log.failure_reason,
            timestamp: at,
        };
        self.staged.logs.push(record.clone());
        Ok(record)
    }
}
