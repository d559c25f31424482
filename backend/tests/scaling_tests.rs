//! Recipe scaling tests for the School Meal Production Platform
//!
//! Covers the scaling factor formula, exact linear scaling of ingredient
//! quantities, and cost estimation with missing prices.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{Recipe, RecipeIngredient};
use shared::scaling::{scale_recipe, ScalingError};
use shared::types::Unit;

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn recipe(reference_servings: i32) -> Recipe {
    Recipe {
        id: Uuid::new_v4(),
        name: "Sayur lodeh".to_string(),
        reference_servings,
        estimated_time_minutes: Some(75),
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

// ============================================================================
// Scaling Factor Formula
// ============================================================================
// For any recipe R and target portions P > 0, the scaling factor SHALL be
// exactly P / R.reference_servings, and every scaled quantity SHALL be the
// reference quantity multiplied by that factor.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn property_scaling_factor_is_portion_ratio(
        reference_servings in 1i32..5000,
        target_portions in 1i32..50000,
    ) {
        let recipe = recipe(reference_servings);
        let scaled = scale_recipe(&recipe, &[], &HashMap::new(), target_portions).unwrap();

        let expected = Decimal::from(target_portions) / Decimal::from(reference_servings);
        prop_assert_eq!(scaled.scaling_factor, expected);
    }

    #[test]
    fn property_quantities_scale_linearly(
        reference_servings in 1i32..1000,
        target_portions in 1i32..10000,
        quantity_cents in 1i64..1_000_000,
    ) {
        let recipe = recipe(reference_servings);
        let material_id = Uuid::new_v4();
        // Quantities with two decimal places, e.g. 12.34 kg
        let reference_quantity = Decimal::new(quantity_cents, 2);
        let ingredients = vec![ingredient(recipe.id, material_id, reference_quantity)];

        let scaled = scale_recipe(&recipe, &ingredients, &HashMap::new(), target_portions).unwrap();

        prop_assert_eq!(
            scaled.ingredients[0].scaled_quantity,
            reference_quantity * scaled.scaling_factor
        );
    }

    #[test]
    fn property_total_cost_sums_known_ingredient_costs(
        target_portions in 1i32..500,
        price_a in 1i64..100_000,
        quantity_a in 1i64..10_000,
        quantity_b in 1i64..10_000,
    ) {
        let recipe = recipe(10);
        let priced = Uuid::new_v4();
        let unpriced = Uuid::new_v4();
        let ingredients = vec![
            ingredient(recipe.id, priced, Decimal::new(quantity_a, 2)),
            ingredient(recipe.id, unpriced, Decimal::new(quantity_b, 2)),
        ];
        let prices = HashMap::from([
            (priced, Some(Decimal::new(price_a, 0))),
            (unpriced, None),
        ]);

        let scaled = scale_recipe(&recipe, &ingredients, &prices, target_portions).unwrap();

        // Total counts only the priced ingredient and is flagged as a lower bound
        prop_assert_eq!(
            scaled.estimated_total_cost,
            scaled.ingredients[0].estimated_cost.unwrap()
        );
        prop_assert!(scaled.cost_is_lower_bound);
        prop_assert!(scaled.ingredients[1].cost_unknown);
    }

    #[test]
    fn property_non_positive_portions_rejected(target_portions in -1000i32..=0) {
        let recipe = recipe(50);
        let err = scale_recipe(&recipe, &[], &HashMap::new(), target_portions).unwrap_err();
        prop_assert_eq!(err, ScalingError::NonPositiveTargetPortions);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_doubling_a_fifty_serving_recipe() {
    let recipe = recipe(50);
    let rice = Uuid::new_v4();
    let ingredients = vec![ingredient(recipe.id, rice, dec("5"))];
    let prices = HashMap::from([(rice, Some(dec("11500")))]);

    let scaled = scale_recipe(&recipe, &ingredients, &prices, 100).unwrap();

    assert_eq!(scaled.scaling_factor, dec("2"));
    assert_eq!(scaled.ingredients[0].scaled_quantity, dec("10"));
}

#[test]
fn test_zero_portions_fails() {
    let recipe = recipe(50);
    assert_eq!(
        scale_recipe(&recipe, &[], &HashMap::new(), 0),
        Err(ScalingError::NonPositiveTargetPortions)
    );
}

#[test]
fn test_zero_reference_servings_fails() {
    let recipe = recipe(0);
    assert_eq!(
        scale_recipe(&recipe, &[], &HashMap::new(), 100),
        Err(ScalingError::NonPositiveReferenceServings)
    );
}

#[test]
fn test_time_estimate_carried_through_unscaled() {
    // Prep/cook time is treated as constant per batch regardless of size
    let recipe = recipe(50);
    let scaled = scale_recipe(&recipe, &[], &HashMap::new(), 1000).unwrap();
    assert_eq!(scaled.estimated_time_minutes, Some(75));
}

#[test]
fn test_downscaling_keeps_precision() {
    let recipe = recipe(3);
    let material_id = Uuid::new_v4();
    let ingredients = vec![ingredient(recipe.id, material_id, dec("1"))];

    let scaled = scale_recipe(&recipe, &ingredients, &HashMap::new(), 1).unwrap();

    let third = Decimal::from(1) / Decimal::from(3);
    assert_eq!(scaled.scaling_factor, third);
    assert_eq!(scaled.ingredients[0].scaled_quantity, third);
}
