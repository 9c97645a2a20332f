use tracing::{debug, instrument};

use super::model::{MaxPortions, Recipe};
use super::store::InventoryStore;

/// Largest number of whole portions the current stock can cover.
///
/// A missing meal and a meal without constraining lines both yield
/// `{0, None}`. Ties keep the first ingredient in line order.
#[instrument(skip(store))]
pub async fn max_portions<S>(store: &mut S, meal_id: i64) -> anyhow::Result<MaxPortions>
where
    S: InventoryStore + ?Sized,
{
    let Some(recipe) = store.load_recipe(meal_id).await? else {
        debug!(meal_id, "meal not found; reporting zero portions");
        return Ok(MaxPortions::none());
    };
    Ok(compute_max_portions(&recipe))
}

pub fn compute_max_portions(recipe: &Recipe) -> MaxPortions {
    let mut best: Option<(i64, &str)> = None;

    for demand in recipe.demands() {
        let possible = whole_portions(demand.stock, demand.per_portion);
        match best {
            Some((min, _)) if possible >= min => {}
            _ => best = Some((possible, demand.name)),
        }
    }

    match best {
        Some((max_portions, name)) => MaxPortions {
            max_portions,
            limiting_ingredient: Some(name.to_string()),
        },
        None => MaxPortions::none(),
    }
}

/// Floor division of stock by requirement; `per_portion` is positive.
fn whole_portions(stock: f64, per_portion: f64) -> i64 {
    stock.max(0.0).div_euclid(per_portion) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::memory::{MemoryInventory, Snapshot};
    use crate::inventory::model::RecipeLine;

    fn recipe(lines: &[(i64, &str, f64, f64)]) -> Recipe {
        Recipe {
            meal_name: "Soup".into(),
            lines: lines
                .iter()
                .map(|(ingredient_id, name, per_portion, stock)| RecipeLine {
                    ingredient_id: *ingredient_id,
                    ingredient_name: name.to_string(),
                    per_portion: *per_portion,
                    unit: "kg".into(),
                    stock: *stock,
                })
                .collect(),
        }
    }

    #[test]
    fn minimum_over_lines_names_limiting_ingredient() {
        let r = recipe(&[(1, "Carrot", 2.0, 10.0), (2, "Salt", 1.0, 3.0)]);
        assert_eq!(
            compute_max_portions(&r),
            MaxPortions {
                max_portions: 3,
                limiting_ingredient: Some("Salt".into())
            }
        );
    }

    #[test]
    fn partial_portions_are_floored() {
        let r = recipe(&[(1, "Rice", 0.3, 1.0)]);
        assert_eq!(compute_max_portions(&r).max_portions, 3);

        let r = recipe(&[(1, "Rice", 0.4, 0.39)]);
        assert_eq!(compute_max_portions(&r).max_portions, 0);
    }

    #[test]
    fn ties_keep_first_line() {
        let r = recipe(&[(1, "Milk", 1.0, 4.0), (2, "Oats", 2.0, 8.0), (3, "Honey", 1.0, 4.0)]);
        assert_eq!(
            compute_max_portions(&r).limiting_ingredient.as_deref(),
            Some("Milk")
        );
    }

    #[test]
    fn empty_recipe_has_no_limit_and_zero_portions() {
        assert_eq!(compute_max_portions(&recipe(&[])), MaxPortions::none());
    }

    #[test]
    fn non_positive_requirement_does_not_divide() {
        let r = recipe(&[(1, "Water", 0.0, 5.0), (2, "Pasta", 1.0, 2.0)]);
        assert_eq!(
            compute_max_portions(&r),
            MaxPortions {
                max_portions: 2,
                limiting_ingredient: Some("Pasta".into())
            }
        );
    }

    #[test]
    fn repeated_ingredient_lines_share_stock() {
        let r = recipe(&[(1, "Oil", 1.0, 6.0), (1, "Oil", 2.0, 6.0)]);
        assert_eq!(compute_max_portions(&r).max_portions, 2);
    }

    #[tokio::test]
    async fn missing_meal_reports_zero() {
        let store = MemoryInventory::new(Snapshot::default());
        let mut unit = store.begin().await;
        assert_eq!(max_portions(&mut unit, 42).await.unwrap(), MaxPortions::none());
    }

    #[tokio::test]
    async fn repeated_reads_agree() {
        let store = MemoryInventory::new(Snapshot::soup());
        let mut unit = store.begin().await;
        let first = max_portions(&mut unit, Snapshot::SOUP).await.unwrap();
        let second = max_portions(&mut unit, Snapshot::SOUP).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.max_portions, 3);
        assert_eq!(first.limiting_ingredient.as_deref(), Some("Salt"));
    }
}
