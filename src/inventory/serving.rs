use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::model::{Deduction, NewServingLog, Recipe, ServingLog, ServingStatus, Shortfall};
use super::store::InventoryTx;

#[derive(Debug, thiserror::Error)]
pub enum ServingError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sufficiency {
    Sufficient(Vec<Deduction>),
    /// Every under-stocked ingredient, in line order. Never empty.
    Insufficient(Vec<Shortfall>),
}

pub fn check_sufficiency(recipe: &Recipe, portions: i32) -> Sufficiency {
    let portions = f64::from(portions);
    let mut deductions = Vec::new();
    let mut shortfalls = Vec::new();

    for demand in recipe.demands() {
        let needed = demand.per_portion * portions;
        if demand.stock < needed {
            shortfalls.push(Shortfall {
                ingredient_id: demand.ingredient_id,
                name: demand.name.to_string(),
                needed,
                available: demand.stock,
                unit: demand.unit.to_string(),
            });
        } else {
            deductions.push(Deduction {
                ingredient_id: demand.ingredient_id,
                amount: needed,
            });
        }
    }

    if shortfalls.is_empty() {
        Sufficiency::Sufficient(deductions)
    } else {
        Sufficiency::Insufficient(shortfalls)
    }
}

/// Serve `portions` of a meal inside the caller's unit of work.
///
/// Either every ingredient is deducted and a `success` log is appended, or
/// nothing is deducted and a `failed` log names the first shortfall. The
/// caller commits `tx`; on any `Err` it must be dropped instead.
#[instrument(skip(tx))]
pub async fn serve_meal<T>(
    tx: &mut T,
    meal_id: i64,
    portions: i32,
    user_id: i64,
) -> Result<ServingLog, ServingError>
where
    T: InventoryTx + ?Sized,
{
    if portions <= 0 {
        return Err(ServingError::InvalidArgument(format!(
            "portions must be a positive integer, got {portions}"
        )));
    }

    let recipe = tx.load_recipe(meal_id).await?;
    let user_name = tx.find_user_name(user_id).await?;
    let (Some(recipe), Some(user_name)) = (recipe, user_name) else {
        warn!(meal_id, user_id, "serving rejected: meal or user not found");
        return Err(ServingError::NotFound("Meal or user not found".into()));
    };

    let now = OffsetDateTime::now_utc();
    let (status, failure_reason) = match check_sufficiency(&recipe, portions) {
        Sufficiency::Sufficient(deductions) => {
            for d in &deductions {
                tx.deduct_stock(d.ingredient_id, d.amount, now).await?;
            }
            (ServingStatus::Success, None)
        }
        Sufficiency::Insufficient(shortfalls) => {
            let reason = shortfalls.first().map(Shortfall::reason);
            warn!(
                meal_id,
                portions,
                short = shortfalls.len(),
                reason = reason.as_deref().unwrap_or_default(),
                "insufficient stock"
            );
            (ServingStatus::Failed, reason)
        }
    };

    let log = tx
        .append_serving_log(
            NewServingLog {
                meal_id,
                meal_name: recipe.meal_name,
                user_id,
                user_name,
                portions,
                status,
                failure_reason,
            },
            now,
        )
        .await?;

    info!(log_id = log.id, meal_id, user_id, portions, status = ?log.status, "serving recorded");
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::memory::{MemoryInventory, Snapshot};
    use crate::inventory::portions::max_portions;

    async fn serve(store: &MemoryInventory, meal_id: i64, portions: i32) -> Result<ServingLog, ServingError> {
        let mut tx = store.begin().await;
        let log = serve_meal(&mut tx, meal_id, portions, Snapshot::COOK).await?;
        tx.commit();
        Ok(log)
    }

    #[tokio::test]
    async fn sufficient_stock_is_deducted() {
        let store = MemoryInventory::new(Snapshot::soup());
        let log = serve(&store, Snapshot::SOUP, 2).await.unwrap();

        assert_eq!(log.status, ServingStatus::Success);
        assert_eq!(log.failure_reason, None);
        assert_eq!(log.portions, 2);
        assert_eq!(log.meal_name, "Soup");
        assert_eq!(log.user_name, "Cook");

        let snap = store.snapshot().await;
        assert_eq!(snap.stock(Snapshot::CARROT), 6.0);
        assert_eq!(snap.stock(Snapshot::SALT), 1.0);
        assert!(snap.ingredient(Snapshot::CARROT).updated_at.is_some());
        assert_eq!(snap.logs.len(), 1);
    }

    #[tokio::test]
    async fn shortfall_on_one_line_blocks_every_deduction() {
        let store = MemoryInventory::new(Snapshot::soup());
        let log = serve(&store, Snapshot::SOUP, 4).await.unwrap();

        assert_eq!(log.status, ServingStatus::Failed);
        assert_eq!(
            log.failure_reason.as_deref(),
            Some("Insufficient Salt (needed 4.0kg, had 3.0kg)")
        );
        assert_eq!(log.portions, 4);

        let snap = store.snapshot().await;
        assert_eq!(snap.stock(Snapshot::CARROT), 10.0);
        assert_eq!(snap.stock(Snapshot::SALT), 3.0);
        assert!(snap.ingredient(Snapshot::CARROT).updated_at.is_none());
        assert_eq!(snap.logs.len(), 1);
    }

    #[tokio::test]
    async fn failure_reason_names_first_short_line() {
        let store = MemoryInventory::new(Snapshot::soup());
        let log = serve(&store, Snapshot::SOUP, 6).await.unwrap();
        // Carrot (12 > 10) and Salt (6 > 3) are both short; Carrot is declared first.
        assert_eq!(
            log.failure_reason.as_deref(),
            Some("Insufficient Carrot (needed 12.0kg, had 10.0kg)")
        );
    }

    #[tokio::test]
    async fn unknown_meal_is_not_found_and_writes_nothing() {
        let store = MemoryInventory::new(Snapshot::soup());
        let err = serve(&store, 999, 1).await.unwrap_err();
        assert!(matches!(err, ServingError::NotFound(_)));
        assert!(store.snapshot().await.logs.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = MemoryInventory::new(Snapshot::soup());
        let mut tx = store.begin().await;
        let err = serve_meal(&mut tx, Snapshot::SOUP, 1, 404).await.unwrap_err();
        assert!(matches!(err, ServingError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_positive_portions_are_rejected() {
        let store = MemoryInventory::new(Snapshot::soup());
        for portions in [0, -3] {
            let err = serve(&store, Snapshot::SOUP, portions).await.unwrap_err();
            assert!(matches!(err, ServingError::InvalidArgument(_)));
        }
        let snap = store.snapshot().await;
        assert!(snap.logs.is_empty());
        assert_eq!(snap.stock(Snapshot::SALT), 3.0);
    }

    #[tokio::test]
    async fn meal_without_lines_always_succeeds() {
        let store = MemoryInventory::new(Snapshot::soup());
        let log = serve(&store, Snapshot::WATER, 5).await.unwrap();
        assert_eq!(log.status, ServingStatus::Success);

        let mut unit = store.begin().await;
        let max = max_portions(&mut unit, Snapshot::WATER).await.unwrap();
        assert_eq!(max.max_portions, 0);
        assert_eq!(max.limiting_ingredient, None);
    }

    #[tokio::test]
    async fn store_failure_rolls_back_deductions() {
        let mut snap = Snapshot::soup();
        snap.fail_log_writes = true;
        let store = MemoryInventory::new(snap);

        let err = serve(&store, Snapshot::SOUP, 1).await.unwrap_err();
        assert!(matches!(err, ServingError::Store(_)));

        let snap = store.snapshot().await;
        assert_eq!(snap.stock(Snapshot::CARROT), 10.0);
        assert_eq!(snap.stock(Snapshot::SALT), 3.0);
        assert!(snap.logs.is_empty());
    }

    #[tokio::test]
    async fn concurrent_servings_never_overdraw() {
        let store = MemoryInventory::new(Snapshot::soup());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { serve(&store, Snapshot::SOUP, 1).await }));
        }

        let mut successes = 0;
        for h in handles {
            if h.await.unwrap().unwrap().status == ServingStatus::Success {
                successes += 1;
            }
        }

        // Salt (3 units, 1 per portion) limits the run to three servings.
        assert_eq!(successes, 3);
        let snap = store.snapshot().await;
        assert_eq!(snap.stock(Snapshot::SALT), 0.0);
        assert_eq!(snap.stock(Snapshot::CARROT), 4.0);
        assert_eq!(snap.logs.len(), 8);
        assert!(snap.ingredients.values().all(|i| i.quantity >= 0.0));
    }

    #[test]
    fn repeated_ingredient_needs_are_summed() {
        use crate::inventory::model::RecipeLine;
        let line = |per_portion| RecipeLine {
            ingredient_id: 1,
            ingredient_name: "Olive oil".into(),
            per_portion,
            unit: "l".into(),
            stock: 3.0,
        };
        let recipe = Recipe {
            meal_name: "Salad".into(),
            lines: vec![line(1.0), line(1.0)],
        };

        assert_eq!(
            check_sufficiency(&recipe, 1),
            Sufficiency::Sufficient(vec![Deduction {
                ingredient_id: 1,
                amount: 2.0
            }])
        );
        match check_sufficiency(&recipe, 2) {
            Sufficiency::Insufficient(s) => assert_eq!(s[0].needed, 4.0),
            other => panic!("expected shortfall, got {other:?}"),
        }
    }
}
