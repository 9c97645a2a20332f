use super::dto::{MealPopularity, WasteEntry};

pub const CHART_PALETTE: [&str; 4] = ["#8884d8", "#82ca9d", "#ffc658", "#ff7c7c"];

/// Entries shown on a chart.
pub const CHART_SLOTS: usize = 4;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `rows` are `(meal name, portions)` sorted by portions descending. Shares
/// are taken against every row, not only the ones that make the chart.
pub fn meal_popularity(rows: Vec<(String, i64)>) -> Vec<MealPopularity> {
    let total: i64 = rows.iter().map(|(_, n)| n).sum();
    let total = if total > 0 { total as f64 } else { 1.0 };
    rows.into_iter()
        .take(CHART_SLOTS)
        .enumerate()
        .map(|(i, (name, portions))| MealPopularity {
            name,
            value: round_to(portions as f64 / total * 100.0, 1),
            color: CHART_PALETTE[i % CHART_PALETTE.len()],
        })
        .collect()
}

/// `rows` are `(ingredient name, surplus above threshold)` sorted by surplus
/// descending.
pub fn waste_analysis(rows: Vec<(String, f64)>) -> Vec<WasteEntry> {
    let total: f64 = rows.iter().map(|(_, w)| w).sum();
    rows.into_iter()
        .take(CHART_SLOTS)
        .map(|(ingredient, wasted)| WasteEntry {
            percentage: if total > 0.0 {
                (wasted / total * 100.0).round() as i64
            } else {
                0
            },
            ingredient,
            wasted,
        })
        .collect()
}
