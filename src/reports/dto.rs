use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339,
    macros::{format_description, time},
    Date, OffsetDateTime, Time,
};

use crate::{error::AppError, ingredients::repo_types::Ingredient};

#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>,
}

impl FormatQuery {
    pub fn ensure_json(&self) -> Result<(), AppError> {
        match self.format.as_deref() {
            None | Some("json") => Ok(()),
            Some(other) => Err(AppError::bad_request(format!(
                "Unsupported report format '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    pub start_date: String,
    pub end_date: String,
    pub format: Option<String>,
}

impl UsageQuery {
    /// Inclusive `[start, end]` bounds. A bare date as `end_date` covers that
    /// whole day.
    pub fn bounds(&self) -> Result<(OffsetDateTime, OffsetDateTime), AppError> {
        let start = parse_bound(&self.start_date, false)
            .ok_or_else(|| AppError::bad_request("start_date must be RFC 3339 or YYYY-MM-DD"))?;
        let end = parse_bound(&self.end_date, true)
            .ok_or_else(|| AppError::bad_request("end_date must be RFC 3339 or YYYY-MM-DD"))?;
        if start > end {
            return Err(AppError::bad_request("start_date must not be after end_date"));
        }
        Ok((start, end))
    }
}

fn parse_bound(raw: &str, end_of_day: bool) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()?;
    let at = if end_of_day {
        time!(23:59:59.999999)
    } else {
        Time::MIDNIGHT
    };
    Some(date.with_time(at).assume_utc())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Low,
    Good,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRow {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub value: f64,
    pub status: StockStatus,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryReport {
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub total_items: usize,
    pub total_value: f64,
    pub low_stock_items: usize,
    pub ingredients: Vec<InventoryRow>,
}

impl InventoryReport {
    pub fn build(generated_at: OffsetDateTime, ingredients: Vec<Ingredient>) -> Self {
        let rows: Vec<InventoryRow> = ingredients
            .into_iter()
            .map(|ing| InventoryRow {
                value: ing.quantity * ing.cost,
                status: if ing.low_stock {
                    StockStatus::Low
                } else {
                    StockStatus::Good
                },
                name: ing.name,
                quantity: ing.quantity,
                unit: ing.unit,
                category: ing.category,
            })
            .collect();
        InventoryReport {
            generated_at,
            total_items: rows.len(),
            total_value: rows.iter().map(|r| r.value).sum(),
            low_stock_items: rows.iter().filter(|r| r.status == StockStatus::Low).count(),
            ingredients: rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub period: Period,
    pub total_meals_served: i64,
    pub success_rate: f64,
}

/// Successful attempts over all attempts; zero when nothing was attempted.
pub fn success_rate(successes: i64, attempts: i64) -> f64 {
    if attempts > 0 {
        successes as f64 / attempts as f64
    } else {
        0.0
    }
}
