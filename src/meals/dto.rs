use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::repo_types::{Meal, MealIngredient};
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct MealLineInput {
    pub ingredient_id: i64,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_servings")]
    pub servings: i32,
    #[serde(default)]
    pub preparation_time: i32,
    #[serde(default)]
    pub ingredients: Vec<MealLineInput>,
}
fn default_servings() -> i32 {
    1
}

/// Partial update; `ingredients`, when present, replaces the whole line set.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMealRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub servings: Option<i32>,
    pub preparation_time: Option<i32>,
    pub ingredients: Option<Vec<MealLineInput>>,
}

#[derive(Debug, Serialize)]
pub struct MealDetails {
    #[serde(flatten)]
    pub meal: Meal,
    pub ingredients: Vec<MealIngredient>,
}

impl MealDetails {
    /// Attach lines (already in line order) to their meals, keeping meal order.
    pub fn assemble(meals: Vec<Meal>, lines: Vec<MealIngredient>) -> Vec<MealDetails> {
        let mut by_meal: HashMap<i64, Vec<MealIngredient>> = HashMap::new();
        for line in lines {
            by_meal.entry(line.meal_id).or_default().push(line);
        }
        meals
            .into_iter()
            .map(|meal| MealDetails {
                ingredients: by_meal.remove(&meal.id).unwrap_or_default(),
                meal,
            })
            .collect()
    }
}

impl CreateMealRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
        validate_counts(Some(self.servings), Some(self.preparation_time))?;
        validate_lines(&self.ingredients)
    }
}

impl UpdateMealRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(AppError::bad_request("name must not be empty"));
        }
        validate_counts(self.servings, self.preparation_time)?;
        match &self.ingredients {
            Some(lines) => validate_lines(lines),
            None => Ok(()),
        }
    }
}

fn validate_counts(servings: Option<i32>, preparation_time: Option<i32>) -> Result<(), AppError> {
    if matches!(servings, Some(s) if s < 1) {
        return Err(AppError::bad_request("servings must be at least 1"));
    }
    if matches!(preparation_time, Some(p) if p < 0) {
        return Err(AppError::bad_request("preparation_time must not be negative"));
    }
    Ok(())
}

/// Per-portion quantities must be positive; a zero requirement would make
/// portion counts undefined.
pub fn validate_lines(lines: &[MealLineInput]) -> Result<(), AppError> {
    for (i, line) in lines.iter().enumerate() {
        if !line.quantity.is_finite() || line.quantity <= 0.0 {
            return Err(AppError::bad_request(format!(
                "ingredients[{i}].quantity must be greater than zero"
            )));
        }
        if line.unit.trim().is_empty() {
            return Err(AppError::bad_request(format!(
                "ingredients[{i}].unit must not be empty"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn line(ingredient_id: i64, quantity: f64) -> MealLineInput {
        MealLineInput {
            ingredient_id,
            quantity,
            unit: "g".into(),
        }
    }

    #[test]
    fn zero_and_negative_line_quantities_are_rejected() {
        assert!(validate_lines(&[line(1, 0.5)]).is_ok());
        assert!(validate_lines(&[line(1, 0.5), line(2, 0.0)]).is_err());
        assert!(validate_lines(&[line(1, -2.0)]).is_err());
        assert!(validate_lines(&[line(1, f64::INFINITY)]).is_err());
    }

    #[test]
    fn create_defaults() {
        let req: CreateMealRequest =
            serde_json::from_value(serde_json::json!({ "name": "Porridge" })).unwrap();
        assert_eq!(req.servings, 1);
        assert!(req.ingredients.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn update_rejects_blank_name_and_bad_counts() {
        let req = UpdateMealRequest {
            name: Some(" ".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateMealRequest {
            servings: Some(0),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn assemble_groups_lines_under_their_meal() {
        let now = OffsetDateTime::now_utc();
        let meal = |id: i64| Meal {
            id,
            name: format!("meal-{id}"),
            description: String::new(),
            category: String::new(),
            servings: 1,
            preparation_time: 0,
            created_at: now,
            updated_at: now,
        };
        let mi = |id: i64, meal_id: i64| MealIngredient {
            id,
            meal_id,
            ingredient_id: id,
            ingredient_name: format!("ing-{id}"),
            quantity: 1.0,
            unit: "g".into(),
        };

        let out = MealDetails::assemble(vec![meal(2), meal(1)], vec![mi(1, 1), mi(2, 2), mi(3, 1)]);
        assert_eq!(out[0].meal.id, 2);
        assert_eq!(out[0].ingredients.len(), 1);
        assert_eq!(
            out[1].ingredients.iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![1, 3]
        );

        let json = serde_json::to_value(&out[1]).unwrap();
        assert_eq!(json["name"], "meal-1");
        assert!(json["ingredients"][0].get("meal_id").is_none());
    }
}
