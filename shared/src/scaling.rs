//! Recipe scaling
//!
//! Pure computation: converts a recipe defined for a reference number of
//! servings into the ingredient quantities and estimated cost of a batch
//! targeting an arbitrary portion count. Callable as a preview, without
//! touching inventory.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Recipe, RecipeIngredient};
use crate::types::Unit;

/// Scaling rejected because of bad input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScalingError {
    #[error("target portions must be positive")]
    NonPositiveTargetPortions,

    #[error("recipe reference servings must be positive")]
    NonPositiveReferenceServings,
}

/// One ingredient scaled to the target portion count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledIngredient {
    pub material_id: Uuid,
    pub unit: Unit,
    pub scaled_quantity: Decimal,
    pub unit_price: Option<Decimal>,
    /// scaled_quantity * unit_price; absent when the price is unknown
    pub estimated_cost: Option<Decimal>,
    /// Set when the material has no price, so the recipe total is known to
    /// be a lower bound rather than silently wrong
    pub cost_unknown: bool,
}

/// Result of scaling a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledRecipe {
    pub scaling_factor: Decimal,
    pub ingredients: Vec<ScaledIngredient>,
    /// Sum of the known ingredient costs
    pub estimated_total_cost: Decimal,
    /// True when at least one ingredient had no price, making the total a
    /// lower bound
    pub cost_is_lower_bound: bool,
    /// Carried through from the recipe unchanged; prep/cook time is treated
    /// as roughly constant per batch regardless of size
    pub estimated_time_minutes: Option<i32>,
}

/// Scale a recipe to a target portion count
///
/// The scaling factor is `target_portions / reference_servings`, kept at
/// full precision; rounding happens only at the display layer so errors do
/// not compound. `unit_prices` maps material ids to their current price;
/// a missing or `None` entry flags the ingredient as `cost_unknown`.
pub fn scale_recipe(
    recipe: &Recipe,
    ingredients: &[RecipeIngredient],
    unit_prices: &HashMap<Uuid, Option<Decimal>>,
    target_portions: i32,
) -> Result<ScaledRecipe, ScalingError> {
    if target_portions <= 0 {
        return Err(ScalingError::NonPositiveTargetPortions);
    }
    if recipe.reference_servings <= 0 {
        return Err(ScalingError::NonPositiveReferenceServings);
    }

    let scaling_factor =
        Decimal::from(target_portions) / Decimal::from(recipe.reference_servings);

    let mut scaled = Vec::with_capacity(ingredients.len());
    let mut estimated_total_cost = Decimal::ZERO;
    let mut cost_is_lower_bound = false;

    for ingredient in ingredients {
        let scaled_quantity = ingredient.reference_quantity * scaling_factor;
        let unit_price = unit_prices
            .get(&ingredient.material_id)
            .copied()
            .flatten();

        let estimated_cost = unit_price.map(|price| scaled_quantity * price);
        if let Some(cost) = estimated_cost {
            estimated_total_cost += cost;
        } else {
            cost_is_lower_bound = true;
        }

        scaled.push(ScaledIngredient {
            material_id: ingredient.material_id,
            unit: ingredient.unit,
            scaled_quantity,
            unit_price,
            estimated_cost,
            cost_unknown: estimated_cost.is_none(),
        });
    }

    Ok(ScaledRecipe {
        scaling_factor,
        ingredients: scaled,
        estimated_total_cost,
        cost_is_lower_bound,
        estimated_time_minutes: recipe.estimated_time_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn recipe(reference_servings: i32) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: "Nasi goreng sayur".to_string(),
            reference_servings,
            estimated_time_minutes: Some(90),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ingredient(recipe_id: Uuid, material_id: Uuid, quantity: Decimal) -> RecipeIngredient {
        RecipeIngredient {
            id: Uuid::new_v4(),
            recipe_id,
            material_id,
            reference_quantity: quantity,
            unit: Unit::Kilogram,
        }
    }

    #[test]
    fn test_scaling_factor_is_portion_ratio() {
        let recipe = recipe(50);
        let rice = Uuid::new_v4();
        let ingredients = vec![ingredient(recipe.id, rice, dec("5"))];
        let prices = HashMap::from([(rice, Some(dec("12000")))]);

        let scaled = scale_recipe(&recipe, &ingredients, &prices, 100).unwrap();

        assert_eq!(scaled.scaling_factor, dec("2"));
        assert_eq!(scaled.ingredients[0].scaled_quantity, dec("10"));
        assert_eq!(scaled.ingredients[0].estimated_cost, Some(dec("120000")));
        assert_eq!(scaled.estimated_total_cost, dec("120000"));
        assert!(!scaled.cost_is_lower_bound);
    }

    #[test]
    fn test_quantities_scale_without_rounding() {
        let recipe = recipe(3);
        let material_id = Uuid::new_v4();
        let ingredients = vec![ingredient(recipe.id, material_id, dec("1"))];

        let scaled = scale_recipe(&recipe, &ingredients, &HashMap::new(), 1).unwrap();

        // One third at full precision, not a display-rounded value
        let factor = Decimal::from(1) / Decimal::from(3);
        assert_eq!(scaled.scaling_factor, factor);
        assert_eq!(scaled.ingredients[0].scaled_quantity, dec("1") * factor);
    }

    #[test]
    fn test_zero_target_portions_rejected() {
        let recipe = recipe(50);
        let err = scale_recipe(&recipe, &[], &HashMap::new(), 0).unwrap_err();
        assert_eq!(err, ScalingError::NonPositiveTargetPortions);
    }

    #[test]
    fn test_negative_target_portions_rejected() {
        let recipe = recipe(50);
        let err = scale_recipe(&recipe, &[], &HashMap::new(), -10).unwrap_err();
        assert_eq!(err, ScalingError::NonPositiveTargetPortions);
    }

    #[test]
    fn test_zero_reference_servings_rejected() {
        let recipe = recipe(0);
        let err = scale_recipe(&recipe, &[], &HashMap::new(), 10).unwrap_err();
        assert_eq!(err, ScalingError::NonPositiveReferenceServings);
    }

    #[test]
    fn test_missing_price_flags_lower_bound() {
        let recipe = recipe(10);
        let rice = Uuid::new_v4();
        let tempeh = Uuid::new_v4();
        let ingredients = vec![
            ingredient(recipe.id, rice, dec("2")),
            ingredient(recipe.id, tempeh, dec("1.5")),
        ];
        // Tempeh has no price on record
        let prices = HashMap::from([(rice, Some(dec("10000"))), (tempeh, None)]);

        let scaled = scale_recipe(&recipe, &ingredients, &prices, 20).unwrap();

        assert!(!scaled.ingredients[0].cost_unknown);
        assert!(scaled.ingredients[1].cost_unknown);
        assert_eq!(scaled.ingredients[1].estimated_cost, None);
        // Total only counts the rice; flagged as a lower bound
        assert_eq!(scaled.estimated_total_cost, dec("40000"));
        assert!(scaled.cost_is_lower_bound);
    }

    #[test]
    fn test_time_estimate_not_scaled() {
        let recipe = recipe(50);
        let scaled = scale_recipe(&recipe, &[], &HashMap::new(), 500).unwrap();
        assert_eq!(scaled.estimated_time_minutes, Some(90));
    }
}
