use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub threshold: f64, // stock at or below this is "low"
    pub category: String,
    pub cost: f64, // per unit
    #[serde(with = "time::serde::rfc3339")]
    pub delivery_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub low_stock: bool,
}
