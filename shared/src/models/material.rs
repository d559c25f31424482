//! Material (raw ingredient) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Unit;

/// A raw material consumed by production batches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    pub category: MaterialCategory,
    /// Canonical unit all lots and recipe quantities use for this material
    pub unit: Unit,
    /// Current reference price; absence means cost cannot be estimated
    pub unit_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category of a material
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    Staple,
    Protein,
    Vegetable,
    Fruit,
    Dairy,
    Seasoning,
    Other,
}

impl MaterialCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialCategory::Staple => "staple",
            MaterialCategory::Protein => "protein",
            MaterialCategory::Vegetable => "vegetable",
            MaterialCategory::Fruit => "fruit",
            MaterialCategory::Dairy => "dairy",
            MaterialCategory::Seasoning => "seasoning",
            MaterialCategory::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "staple" => Some(MaterialCategory::Staple),
            "protein" => Some(MaterialCategory::Protein),
            "vegetable" => Some(MaterialCategory::Vegetable),
            "fruit" => Some(MaterialCategory::Fruit),
            "dairy" => Some(MaterialCategory::Dairy),
            "seasoning" => Some(MaterialCategory::Seasoning),
            "other" => Some(MaterialCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
