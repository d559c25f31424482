//! Validation utilities for the School Meal Production Platform

use rust_decimal::Decimal;

use crate::types::Unit;

// ============================================================================
// Production Validations
// ============================================================================

/// Validate a target portion count for a production batch
pub fn validate_target_portions(portions: i32) -> Result<(), &'static str> {
    if portions <= 0 {
        return Err("Target portions must be positive");
    }
    Ok(())
}

/// Validate the reference serving count of a recipe
pub fn validate_reference_servings(servings: i32) -> Result<(), &'static str> {
    if servings <= 0 {
        return Err("Reference servings must be positive");
    }
    Ok(())
}

/// Validate a quantity (lot receipt, ingredient line, actual output)
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a unit price
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}

/// Validate that an ingredient line uses its material's canonical unit
///
/// Quantities for one material must stay in a single unit so lot deduction
/// never has to convert.
pub fn validate_ingredient_unit(
    ingredient_unit: Unit,
    material_unit: Unit,
) -> Result<(), &'static str> {
    if ingredient_unit != material_unit {
        return Err("Ingredient unit must match the material's canonical unit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_target_portions() {
        assert!(validate_target_portions(1).is_ok());
        assert!(validate_target_portions(500).is_ok());
        assert!(validate_target_portions(0).is_err());
        assert!(validate_target_portions(-10).is_err());
    }

    #[test]
    fn test_reference_servings() {
        assert!(validate_reference_servings(50).is_ok());
        assert!(validate_reference_servings(0).is_err());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(Decimal::from_str("0.25").unwrap()).is_ok());
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(Decimal::from(-3)).is_err());
    }

    #[test]
    fn test_unit_price() {
        assert!(validate_unit_price(Decimal::ZERO).is_ok());
        assert!(validate_unit_price(Decimal::from(11500)).is_ok());
        assert!(validate_unit_price(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_ingredient_unit() {
        assert!(validate_ingredient_unit(Unit::Kilogram, Unit::Kilogram).is_ok());
        assert!(validate_ingredient_unit(Unit::Gram, Unit::Kilogram).is_err());
    }
}
