use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub delivery_date: OffsetDateTime,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateIngredientRequest {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub threshold: Option<f64>,
    pub category: Option<String>,
    pub cost: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub delivery_date: Option<OffsetDateTime>,
}

impl CreateIngredientRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        non_empty("name", &self.name)?;
        non_empty("unit", &self.unit)?;
        amount("quantity", self.quantity)?;
        amount("threshold", self.threshold)?;
        amount("cost", self.cost)
    }
}

impl UpdateIngredientRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            non_empty("name", name)?;
        }
        if let Some(unit) = &self.unit {
            non_empty("unit", unit)?;
        }
        for (field, value) in [
            ("quantity", self.quantity),
            ("threshold", self.threshold),
            ("cost", self.cost),
        ] {
            if let Some(v) = value {
                amount(field, v)?;
            }
        }
        Ok(())
    }
}

fn non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} must not be empty")));
    }
    Ok(())
}

fn amount(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::bad_request(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrots() -> CreateIngredientRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Carrot",
            "quantity": 10.0,
            "unit": "kg",
            "threshold": 2.0,
            "category": "vegetables",
            "cost": 1.2,
            "delivery_date": "2026-03-01T08:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn valid_create_passes() {
        assert!(carrots().validate().is_ok());
    }

    #[test]
    fn negative_or_nan_amounts_are_rejected() {
        let mut req = carrots();
        req.quantity = -1.0;
        assert!(req.validate().is_err());

        let mut req = carrots();
        req.cost = f64::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        let req: UpdateIngredientRequest =
            serde_json::from_value(serde_json::json!({ "quantity": 4.5 })).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.delivery_date.is_none());

        let req: UpdateIngredientRequest =
            serde_json::from_value(serde_json::json!({ "unit": "  " })).unwrap();
        assert!(req.validate().is_err());
    }
}
