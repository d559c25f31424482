//! Consumption report tests for the School Meal Production Platform
//!
//! Covers aggregation of the transaction log: per-material netting, value
//! totals, and the empty-log case.

use std::str::FromStr;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::ledger::summarize_consumption;
use shared::models::{InventoryTransaction, TransactionKind};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn tx(
    batch_id: Uuid,
    material_id: Uuid,
    kind: TransactionKind,
    amount: Decimal,
    unit_price: Decimal,
) -> InventoryTransaction {
    InventoryTransaction {
        id: Uuid::new_v4(),
        seq: 0,
        batch_id,
        material_id,
        lot_id: Uuid::new_v4(),
        kind,
        amount,
        unit_price_at_transaction: unit_price,
        quantity_before: Decimal::ZERO,
        quantity_after: Decimal::ZERO,
        performed_by: "dapur pusat".to_string(),
        performed_at: Utc::now(),
    }
}

// ============================================================================
// Aggregation Properties
// ============================================================================
// Net consumption per material SHALL equal deductions minus rollbacks, and
// the summary totals SHALL equal the sums over all materials.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn property_summary_totals_match_material_sums(
        amounts in prop::collection::vec((0usize..3, 1i64..10_000, 1i64..50_000, any::<bool>()), 0..20),
    ) {
        let batch_id = Uuid::new_v4();
        let materials = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        let transactions: Vec<InventoryTransaction> = amounts
            .iter()
            .map(|(material_index, amount, price, is_rollback)| {
                let kind = if *is_rollback {
                    TransactionKind::Rollback
                } else {
                    TransactionKind::Deduction
                };
                tx(
                    batch_id,
                    materials[*material_index],
                    kind,
                    Decimal::new(*amount, 2),
                    Decimal::new(*price, 0),
                )
            })
            .collect();

        let (totals, summary) = summarize_consumption(&transactions);

        let deducted: Decimal = totals.iter().map(|t| t.deducted_value).sum();
        let rolled_back: Decimal = totals.iter().map(|t| t.rolled_back_value).sum();
        prop_assert_eq!(summary.total_deducted_value, deducted);
        prop_assert_eq!(summary.total_rolled_back_value, rolled_back);
        prop_assert_eq!(summary.net_consumption_value, deducted - rolled_back);

        for material in &totals {
            prop_assert_eq!(
                material.net_quantity,
                material.deducted_quantity - material.rolled_back_quantity
            );
            prop_assert_eq!(
                material.net_value,
                material.deducted_value - material.rolled_back_value
            );
        }

        let expects_active = totals.iter().any(|t| t.net_quantity > Decimal::ZERO);
        prop_assert_eq!(summary.has_active_consumption, expects_active);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_empty_log_yields_empty_aggregates() {
    // A batch with no transactions (e.g., still draft) is not an error
    let (totals, summary) = summarize_consumption(&[]);

    assert!(totals.is_empty());
    assert_eq!(summary.total_deducted_value, Decimal::ZERO);
    assert_eq!(summary.total_rolled_back_value, Decimal::ZERO);
    assert_eq!(summary.net_consumption_value, Decimal::ZERO);
    assert!(!summary.has_active_consumption);
}

#[test]
fn test_consumption_values_use_transaction_prices() {
    let batch_id = Uuid::new_v4();
    let rice = Uuid::new_v4();
    // Two lots deducted at different receipt prices
    let transactions = vec![
        tx(batch_id, rice, TransactionKind::Deduction, dec("7"), dec("11500")),
        tx(batch_id, rice, TransactionKind::Deduction, dec("3"), dec("12000")),
    ];

    let (totals, summary) = summarize_consumption(&transactions);

    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].deducted_quantity, dec("10"));
    assert_eq!(totals[0].deducted_value, dec("116500"));
    assert_eq!(summary.net_consumption_value, dec("116500"));
    assert!(summary.has_active_consumption);
}

#[test]
fn test_cancelled_batch_nets_to_zero() {
    let batch_id = Uuid::new_v4();
    let rice = Uuid::new_v4();
    let oil = Uuid::new_v4();
    let transactions = vec![
        tx(batch_id, rice, TransactionKind::Deduction, dec("10"), dec("11500")),
        tx(batch_id, oil, TransactionKind::Deduction, dec("2"), dec("18000")),
        tx(batch_id, oil, TransactionKind::Rollback, dec("2"), dec("18000")),
        tx(batch_id, rice, TransactionKind::Rollback, dec("10"), dec("11500")),
    ];

    let (totals, summary) = summarize_consumption(&transactions);

    assert_eq!(totals.len(), 2);
    for material in &totals {
        assert_eq!(material.net_quantity, Decimal::ZERO);
        assert_eq!(material.net_value, Decimal::ZERO);
    }
    assert!(!summary.has_active_consumption);
    assert_eq!(summary.net_consumption_value, Decimal::ZERO);
}

#[test]
fn test_materials_reported_in_first_touched_order() {
    let batch_id = Uuid::new_v4();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let transactions = vec![
        tx(batch_id, first, TransactionKind::Deduction, dec("1"), dec("100")),
        tx(batch_id, second, TransactionKind::Deduction, dec("1"), dec("100")),
        tx(batch_id, first, TransactionKind::Deduction, dec("1"), dec("100")),
    ];

    let (totals, _) = summarize_consumption(&transactions);

    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].material_id, first);
    assert_eq!(totals[1].material_id, second);
    assert_eq!(totals[0].deducted_quantity, dec("2"));
}
