use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub servings: i32, // intended yield of the recipe, informational
    pub preparation_time: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Recipe line joined with its ingredient's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealIngredient {
    pub id: i64,
    #[serde(skip_serializing)]
    pub meal_id: i64,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub quantity: f64, // per portion
    pub unit: String,
}
