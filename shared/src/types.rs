//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Measurement unit for materials and ingredient quantities
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Kilogram,
    Gram,
    Liter,
    Milliliter,
    Piece,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kilogram => "kg",
            Unit::Gram => "g",
            Unit::Liter => "l",
            Unit::Milliliter => "ml",
            Unit::Piece => "pcs",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "kg" => Some(Unit::Kilogram),
            "g" => Some(Unit::Gram),
            "l" => Some(Unit::Liter),
            "ml" => Some(Unit::Milliliter),
            "pcs" => Some(Unit::Piece),
            _ => None,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}
