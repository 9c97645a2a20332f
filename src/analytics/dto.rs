use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};

use crate::error::AppError;

pub const MAX_WINDOW_DAYS: i64 = 365;

/// Look-back window for the chart endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WindowQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}
fn default_days() -> i64 {
    30
}

impl WindowQuery {
    /// Start of the window ending at `now`.
    pub fn since(&self, now: OffsetDateTime) -> Result<OffsetDateTime, AppError> {
        if !(1..=MAX_WINDOW_DAYS).contains(&self.days) {
            return Err(AppError::bad_request(format!(
                "days must be between 1 and {MAX_WINDOW_DAYS}"
            )));
        }
        Ok(now - Duration::days(self.days))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_ingredients: i64,
    pub low_stock_items: i64,
    pub meals_served_today: i64,
    pub inventory_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct IngredientUsage {
    pub name: String,
    pub total_used: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealPopularity {
    pub name: String,
    pub value: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WasteEntry {
    pub ingredient: String,
    pub wasted: f64,
    pub percentage: i64,
}
