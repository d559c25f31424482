//! Inventory ledger planning
//!
//! Pure deduction/rollback planning over lot snapshots. The backend wraps
//! these plans in a database transaction so that lot decrements and the
//! ledger append commit together; nothing here touches storage.
//!
//! Deductions walk lots oldest-received first (FIFO, minimizing spoilage
//! risk). Rollbacks reverse the same lots in reverse order of the original
//! deduction, capped at the consumption still outstanding for the
//! batch/material pair.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{InventoryTransaction, TransactionKind};

/// Ledger planning failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("insufficient stock: required {required}, available {available}")]
    InsufficientStock {
        required: Decimal,
        available: Decimal,
    },

    /// The recorded rollbacks for a lot exceed its recorded deductions.
    /// This is an ordering bug in the caller, not a business condition.
    #[error("rollback of {rolled_back} exceeds deducted {deducted} for lot {lot_id}")]
    OverRollback {
        lot_id: Uuid,
        deducted: Decimal,
        rolled_back: Decimal,
    },

    #[error("lot {0} referenced by the ledger is not present")]
    UnknownLot(Uuid),
}

/// Point-in-time view of a lot, as read under lock by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotSnapshot {
    pub lot_id: Uuid,
    pub quantity_on_hand: Decimal,
    pub unit_price: Decimal,
}

/// One planned lot adjustment, with the before/after quantities recorded
/// for audit reconstruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMovement {
    pub lot_id: Uuid,
    pub amount: Decimal,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
    pub unit_price: Decimal,
}

/// Minimal view of one recorded transaction for a batch/material pair,
/// in ledger order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub lot_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
}

impl From<&InventoryTransaction> for LedgerEntry {
    fn from(tx: &InventoryTransaction) -> Self {
        LedgerEntry {
            lot_id: tx.lot_id,
            kind: tx.kind,
            amount: tx.amount,
        }
    }
}

/// Plan a FIFO deduction of `required` across `lots`
///
/// `lots` must be ordered oldest-received first; only lots with stock on
/// hand are drawn from. Fails with [`LedgerError::InsufficientStock`] when
/// the lots cannot cover the full amount — a deduction is all-or-nothing
/// for the material, never partial.
pub fn plan_deduction(
    lots: &[LotSnapshot],
    required: Decimal,
) -> Result<Vec<PlannedMovement>, LedgerError> {
    if required <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(required));
    }

    let available: Decimal = lots.iter().map(|lot| lot.quantity_on_hand).sum();
    if available < required {
        return Err(LedgerError::InsufficientStock {
            required,
            available,
        });
    }

    let mut remaining = required;
    let mut movements = Vec::new();

    for lot in lots {
        if remaining.is_zero() {
            break;
        }
        if lot.quantity_on_hand <= Decimal::ZERO {
            continue;
        }

        let amount = lot.quantity_on_hand.min(remaining);
        movements.push(PlannedMovement {
            lot_id: lot.lot_id,
            amount,
            quantity_before: lot.quantity_on_hand,
            quantity_after: lot.quantity_on_hand - amount,
            unit_price: lot.unit_price,
        });
        remaining -= amount;
    }

    Ok(movements)
}

/// Net consumption still charged against a batch/material pair
pub fn outstanding_consumption(entries: &[LedgerEntry]) -> Decimal {
    entries.iter().fold(Decimal::ZERO, |acc, entry| match entry.kind {
        TransactionKind::Deduction => acc + entry.amount,
        TransactionKind::Rollback => acc - entry.amount,
    })
}

/// Plan the restoration of all outstanding consumption for a batch/material
///
/// Lots are restored in reverse order of their original deduction, each up
/// to its own outstanding amount. Once everything has been rolled back the
/// plan is empty, making a repeated rollback a no-op rather than an error.
/// A history whose rollbacks exceed its deductions for some lot fails with
/// [`LedgerError::OverRollback`].
pub fn plan_restoration(
    entries: &[LedgerEntry],
    lots: &[LotSnapshot],
) -> Result<Vec<PlannedMovement>, LedgerError> {
    let mut outstanding_by_lot: HashMap<Uuid, Decimal> = HashMap::new();
    for entry in entries {
        let outstanding = outstanding_by_lot.entry(entry.lot_id).or_default();
        match entry.kind {
            TransactionKind::Deduction => *outstanding += entry.amount,
            TransactionKind::Rollback => *outstanding -= entry.amount,
        }
    }

    for (lot_id, outstanding) in &outstanding_by_lot {
        if *outstanding < Decimal::ZERO {
            let deducted = entries
                .iter()
                .filter(|e| e.lot_id == *lot_id && e.kind == TransactionKind::Deduction)
                .map(|e| e.amount)
                .sum::<Decimal>();
            return Err(LedgerError::OverRollback {
                lot_id: *lot_id,
                deducted,
                rolled_back: deducted - *outstanding,
            });
        }
    }

    let snapshots: HashMap<Uuid, &LotSnapshot> =
        lots.iter().map(|lot| (lot.lot_id, lot)).collect();

    // Most-recently-deducted lot first
    let mut movements = Vec::new();
    let mut planned: HashSet<Uuid> = HashSet::new();
    for entry in entries.iter().rev() {
        if entry.kind != TransactionKind::Deduction {
            continue;
        }
        if !planned.insert(entry.lot_id) {
            continue;
        }

        let outstanding = outstanding_by_lot[&entry.lot_id];
        if outstanding.is_zero() {
            continue;
        }

        let snapshot = snapshots
            .get(&entry.lot_id)
            .ok_or(LedgerError::UnknownLot(entry.lot_id))?;
        movements.push(PlannedMovement {
            lot_id: entry.lot_id,
            amount: outstanding,
            quantity_before: snapshot.quantity_on_hand,
            quantity_after: snapshot.quantity_on_hand + outstanding,
            unit_price: snapshot.unit_price,
        });
    }

    Ok(movements)
}

/// Per-material consumption aggregated from a batch's transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialTotals {
    pub material_id: Uuid,
    pub deducted_quantity: Decimal,
    pub rolled_back_quantity: Decimal,
    pub net_quantity: Decimal,
    pub deducted_value: Decimal,
    pub rolled_back_value: Decimal,
    pub net_value: Decimal,
}

/// Batch-level consumption summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionTotals {
    pub total_deducted_value: Decimal,
    pub total_rolled_back_value: Decimal,
    pub net_consumption_value: Decimal,
    /// True while any material still has net consumption charged
    pub has_active_consumption: bool,
}

/// Aggregate a batch's transaction log into per-material and overall totals
///
/// A batch with no transactions (e.g., still draft) yields empty aggregates.
pub fn summarize_consumption(
    transactions: &[InventoryTransaction],
) -> (Vec<MaterialTotals>, ConsumptionTotals) {
    let mut order: Vec<Uuid> = Vec::new();
    let mut by_material: HashMap<Uuid, MaterialTotals> = HashMap::new();

    for tx in transactions {
        let totals = by_material.entry(tx.material_id).or_insert_with(|| {
            order.push(tx.material_id);
            MaterialTotals {
                material_id: tx.material_id,
                deducted_quantity: Decimal::ZERO,
                rolled_back_quantity: Decimal::ZERO,
                net_quantity: Decimal::ZERO,
                deducted_value: Decimal::ZERO,
                rolled_back_value: Decimal::ZERO,
                net_value: Decimal::ZERO,
            }
        });

        let value = tx.amount * tx.unit_price_at_transaction;
        match tx.kind {
            TransactionKind::Deduction => {
                totals.deducted_quantity += tx.amount;
                totals.deducted_value += value;
            }
            TransactionKind::Rollback => {
                totals.rolled_back_quantity += tx.amount;
                totals.rolled_back_value += value;
            }
        }
        totals.net_quantity = totals.deducted_quantity - totals.rolled_back_quantity;
        totals.net_value = totals.deducted_value - totals.rolled_back_value;
    }

    let materials: Vec<MaterialTotals> = order
        .into_iter()
        .map(|id| by_material.remove(&id).expect("aggregated material"))
        .collect();

    let summary = ConsumptionTotals {
        total_deducted_value: materials.iter().map(|m| m.deducted_value).sum(),
        total_rolled_back_value: materials.iter().map(|m| m.rolled_back_value).sum(),
        net_consumption_value: materials.iter().map(|m| m.net_value).sum(),
        has_active_consumption: materials.iter().any(|m| m.net_quantity > Decimal::ZERO),
    };

    (materials, summary)
}
