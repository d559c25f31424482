//! Recipe models
//!
//! Recipes are authored by the menu-planning module and only read here.
//! Once a production batch references a recipe, scaling stays reproducible
//! because the batch stores its own scaling factor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Unit;

/// A recipe defined for a reference number of servings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    /// Number of portions the ingredient quantities are defined for
    pub reference_servings: i32,
    /// Prep/cook time for one batch; not scaled with batch size
    pub estimated_time_minutes: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ingredient line of a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub material_id: Uuid,
    /// Quantity needed to produce the full reference batch
    pub reference_quantity: Decimal,
    pub unit: Unit,
}
