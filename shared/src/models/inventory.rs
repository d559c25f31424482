//! Inventory lot and transaction models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discrete received quantity of one material
///
/// Lots are the unit of deduction. `quantity_on_hand` is mutated only by
/// the inventory ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLot {
    pub id: Uuid,
    pub material_id: Uuid,
    pub quantity_on_hand: Decimal,
    /// Price snapshot taken at receipt time
    pub unit_price: Decimal,
    pub supplier: Option<String>,
    pub lot_number: Option<String>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deduction,
    Rollback,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deduction => "deduction",
            TransactionKind::Rollback => "rollback",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deduction" => Some(TransactionKind::Deduction),
            "rollback" => Some(TransactionKind::Rollback),
            _ => None,
        }
    }
}

/// An append-only ledger transaction against one lot
///
/// The transaction log is the sole source of truth for what a batch
/// consumed: net consumption per batch/material is the sum of deductions
/// minus the sum of rollbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: Uuid,
    /// Position in the ledger's total order; rollbacks reverse deductions
    /// in descending `seq` order
    pub seq: i64,
    pub batch_id: Uuid,
    pub material_id: Uuid,
    pub lot_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub unit_price_at_transaction: Decimal,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
    pub performed_by: String,
    pub performed_at: DateTime<Utc>,
}
