use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// One recipe line joined with the ingredient it consumes.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RecipeLine {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub per_portion: f64, // required quantity for one portion
    pub unit: String,     // unit label of the line
    pub stock: f64,       // ingredient quantity at read time
}

/// A meal together with its lines in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub meal_name: String,
    pub lines: Vec<RecipeLine>,
}

/// Per-ingredient requirement of a recipe.
///
/// Lines pointing at the same ingredient are summed so that a meal using an
/// ingredient twice is checked against a single stock figure. Lines with a
/// non-positive or non-finite requirement never constrain anything and are
/// left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Demand<'a> {
    pub ingredient_id: i64,
    pub name: &'a str,
    pub unit: &'a str,
    pub per_portion: f64,
    pub stock: f64,
}

impl Recipe {
    /// Demands in order of each ingredient's first appearance.
    pub fn demands(&self) -> Vec<Demand<'_>> {
        let mut out: Vec<Demand<'_>> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !(line.per_portion.is_finite() && line.per_portion > 0.0) {
                continue;
            }
            match out.iter_mut().find(|d| d.ingredient_id == line.ingredient_id) {
                Some(existing) => existing.per_portion += line.per_portion,
                None => out.push(Demand {
                    ingredient_id: line.ingredient_id,
                    name: &line.ingredient_name,
                    unit: &line.unit,
                    per_portion: line.per_portion,
                    stock: line.stock,
                }),
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxPortions {
    pub max_portions: i64,
    pub limiting_ingredient: Option<String>,
}

impl MaxPortions {
    pub fn none() -> Self {
        Self {
            max_portions: 0,
            limiting_ingredient: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "serving_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ServingStatus {
    Success,
    Failed,
}

/// Append-only record of one serving attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ServingLog {
    pub id: i64,
    pub meal_id: i64,
    pub meal_name: String,
    pub user_id: i64,
    pub user_name: String,
    pub portions: i32,
    pub status: ServingStatus,
    pub failure_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewServingLog {
    pub meal_id: i64,
    pub meal_name: String,
    pub user_id: i64,
    pub user_name: String,
    pub portions: i32,
    pub status: ServingStatus,
    pub failure_reason: Option<String>,
}

/// An ingredient that cannot cover a requested serving.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
    pub ingredient_id: i64,
    pub name: String,
    pub needed: f64,
    pub available: f64,
    pub unit: String,
}

impl Shortfall {
    pub fn reason(&self) -> String {
        format!(
            "Insufficient {} (needed {}{}, had {}{})",
            self.name,
            quantity(self.needed),
            self.unit,
            quantity(self.available),
            self.unit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deduction {
    pub ingredient_id: i64,
    pub amount: f64,
}

/// Always keeps a fractional digit: `4.0`, `2.5`.
fn quantity(v: f64) -> String {
    format!("{v:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ingredient_id: i64, name: &str, per_portion: f64, stock: f64) -> RecipeLine {
        RecipeLine {
            ingredient_id,
            ingredient_name: name.into(),
            per_portion,
            unit: "g".into(),
            stock,
        }
    }

    #[test]
    fn shortfall_reason_format() {
        let s = Shortfall {
            ingredient_id: 2,
            name: "Salt".into(),
            needed: 4.0,
            available: 3.0,
            unit: "kg".into(),
        };
        assert_eq!(s.reason(), "Insufficient Salt (needed 4.0kg, had 3.0kg)");

        let s = Shortfall {
            needed: 2.5,
            available: 0.75,
            ..s
        };
        assert_eq!(s.reason(), "Insufficient Salt (needed 2.5kg, had 0.75kg)");
    }

    #[test]
    fn demands_merge_repeated_ingredients_in_first_seen_order() {
        let recipe = Recipe {
            meal_name: "Stew".into(),
            lines: vec![
                line(7, "Oil", 1.0, 10.0),
                line(3, "Onion", 2.0, 10.0),
                line(7, "Oil", 0.5, 10.0),
            ],
        };
        let demands = recipe.demands();
        assert_eq!(demands.len(), 2);
        assert_eq!(demands[0].name, "Oil");
        assert_eq!(demands[0].per_portion, 1.5);
        assert_eq!(demands[1].name, "Onion");
    }

    #[test]
    fn demands_skip_non_positive_requirements() {
        let recipe = Recipe {
            meal_name: "Tea".into(),
            lines: vec![
                line(1, "Water", 0.0, 1.0),
                line(2, "Leaves", -1.0, 1.0),
                line(3, "Sugar", f64::NAN, 1.0),
            ],
        };
        assert!(recipe.demands().is_empty());
    }

    #[test]
    fn serving_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ServingStatus::Failed).unwrap(), "\"failed\"");
        assert_eq!(serde_json::to_string(&ServingStatus::Success).unwrap(), "\"success\"");
    }
}
