use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::dto::{
    success_rate, FormatQuery, InventoryReport, Period, UsageQuery, UsageReport,
};
use super::repo;
use crate::{auth::CurrentUser, error::AppError, ingredients, state::AppState};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports/inventory", get(inventory_report))
        .route("/reports/usage", get(usage_report))
}

#[instrument(skip(state, current))]
pub async fn inventory_report(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(q): Query<FormatQuery>,
) -> Result<Json<InventoryReport>, AppError> {
    current.require_staff_manager()?;
    q.ensure_json()?;
    let all = ingredients::repo::list_all(&state.db).await?;
    let report = InventoryReport::build(OffsetDateTime::now_utc(), all);
    info!(
        user_id = current.id(),
        total_items = report.total_items,
        "inventory report generated"
    );
    Ok(Json(report))
}

#[instrument(skip(state, current))]
pub async fn usage_report(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(q): Query<UsageQuery>,
) -> Result<Json<UsageReport>, AppError> {
    current.require_staff_manager()?;
    FormatQuery { format: q.format.clone() }.ensure_json()?;
    let (start, end) = q.bounds()?;

    let (portions, successes, attempts) = repo::usage_totals(&state.db, start, end).await?;
    info!(user_id = current.id(), attempts, "usage report generated");
    Ok(Json(UsageReport {
        period: Period {
            start: q.start_date,
            end: q.end_date,
        },
        total_meals_served: portions,
        success_rate: success_rate(successes, attempts),
    }))
}
