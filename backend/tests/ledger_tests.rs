//! Inventory ledger tests for the School Meal Production Platform
//!
//! Covers FIFO lot deduction, all-or-nothing failure on insufficient stock,
//! reverse-order restoration, and rollback idempotency.

use std::str::FromStr;

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::ledger::{
    outstanding_consumption, plan_deduction, plan_restoration, LedgerEntry, LedgerError,
    LotSnapshot, PlannedMovement,
};
use shared::models::TransactionKind;

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn lot(quantity: Decimal) -> LotSnapshot {
    LotSnapshot {
        lot_id: Uuid::new_v4(),
        quantity_on_hand: quantity,
        unit_price: dec("10000"),
    }
}

fn entries(movements: &[PlannedMovement], kind: TransactionKind) -> Vec<LedgerEntry> {
    movements
        .iter()
        .map(|m| LedgerEntry {
            lot_id: m.lot_id,
            kind,
            amount: m.amount,
        })
        .collect()
}

/// Apply planned movements to the snapshots, as the service does in SQL
fn apply(lots: &mut [LotSnapshot], movements: &[PlannedMovement]) {
    for movement in movements {
        let lot = lots.iter_mut().find(|l| l.lot_id == movement.lot_id).unwrap();
        assert_eq!(lot.quantity_on_hand, movement.quantity_before);
        lot.quantity_on_hand = movement.quantity_after;
    }
}

/// Strategy for a FIFO-ordered shelf of 1..6 lots with 0..100.00 on hand
fn lots_strategy() -> impl Strategy<Value = Vec<LotSnapshot>> {
    prop::collection::vec(0i64..10_000, 1..6)
        .prop_map(|quantities| quantities.into_iter().map(|q| lot(Decimal::new(q, 2))).collect())
}

// ============================================================================
// Deduction Properties
// ============================================================================
// A successful deduction SHALL draw exactly the required amount, never
// overdraw a lot, and exhaust older lots before touching newer ones. When
// the material cannot cover the amount, the deduction SHALL fail leaving
// every lot untouched.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn property_deduction_draws_exactly_the_required_amount(
        lots in lots_strategy(),
        required_cents in 1i64..60_000,
    ) {
        let required = Decimal::new(required_cents, 2);
        let available: Decimal = lots.iter().map(|l| l.quantity_on_hand).sum();

        match plan_deduction(&lots, required) {
            Ok(movements) => {
                prop_assert!(available >= required);
                let drawn: Decimal = movements.iter().map(|m| m.amount).sum();
                prop_assert_eq!(drawn, required);
                for movement in &movements {
                    prop_assert!(movement.amount > Decimal::ZERO);
                    prop_assert_eq!(
                        movement.quantity_after,
                        movement.quantity_before - movement.amount
                    );
                    prop_assert!(movement.quantity_after >= Decimal::ZERO);
                }
            }
            Err(LedgerError::InsufficientStock { required: r, available: a }) => {
                prop_assert_eq!(r, required);
                prop_assert_eq!(a, available);
                prop_assert!(available < required);
            }
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }

    #[test]
    fn property_deduction_is_fifo(
        lots in lots_strategy(),
        required_cents in 1i64..60_000,
    ) {
        let required = Decimal::new(required_cents, 2);
        if let Ok(movements) = plan_deduction(&lots, required) {
            // A lot is drawn from only if every older stocked lot is exhausted
            let last_touched = movements.last().map(|m| m.lot_id);
            for movement in &movements {
                if Some(movement.lot_id) != last_touched {
                    prop_assert_eq!(movement.quantity_after, Decimal::ZERO);
                }
            }
            // Draws appear in shelf order
            let order: Vec<Uuid> = lots.iter().map(|l| l.lot_id).collect();
            let mut previous_index = 0;
            for movement in &movements {
                let index = order.iter().position(|id| *id == movement.lot_id).unwrap();
                prop_assert!(index >= previous_index);
                previous_index = index;
            }
        }
    }

    #[test]
    fn property_deduct_then_rollback_restores_all_lots(
        lots in lots_strategy(),
        required_cents in 1i64..60_000,
    ) {
        let required = Decimal::new(required_cents, 2);
        let original = lots.clone();
        let mut lots = lots;

        if let Ok(deductions) = plan_deduction(&lots, required) {
            apply(&mut lots, &deductions);
            let mut history = entries(&deductions, TransactionKind::Deduction);

            let restores = plan_restoration(&history, &lots).unwrap();
            apply(&mut lots, &restores);
            history.extend(entries(&restores, TransactionKind::Rollback));

            for (restored, before) in lots.iter().zip(original.iter()) {
                prop_assert_eq!(restored.quantity_on_hand, before.quantity_on_hand);
            }
            prop_assert_eq!(outstanding_consumption(&history), Decimal::ZERO);

            // A second rollback is an idempotent no-op
            let again = plan_restoration(&history, &lots).unwrap();
            prop_assert!(again.is_empty());
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_two_lot_fifo_split() {
    // 10 kg required against a 7 kg lot received first and a 5 kg lot after
    let lot_a = lot(dec("7"));
    let lot_b = lot(dec("5"));
    let lots = vec![lot_a.clone(), lot_b.clone()];

    let movements = plan_deduction(&lots, dec("10")).unwrap();

    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].lot_id, lot_a.lot_id);
    assert_eq!(movements[0].amount, dec("7"));
    assert_eq!(movements[0].quantity_after, dec("0"));
    assert_eq!(movements[1].lot_id, lot_b.lot_id);
    assert_eq!(movements[1].amount, dec("3"));
    assert_eq!(movements[1].quantity_after, dec("2"));
}

#[test]
fn test_rollback_reverses_most_recent_lot_first() {
    let lot_a = lot(dec("7"));
    let lot_b = lot(dec("5"));
    let mut lots = vec![lot_a.clone(), lot_b.clone()];

    let deductions = plan_deduction(&lots, dec("10")).unwrap();
    apply(&mut lots, &deductions);
    let history = entries(&deductions, TransactionKind::Deduction);

    let restores = plan_restoration(&history, &lots).unwrap();

    assert_eq!(restores.len(), 2);
    assert_eq!(restores[0].lot_id, lot_b.lot_id);
    assert_eq!(restores[0].amount, dec("3"));
    assert_eq!(restores[1].lot_id, lot_a.lot_id);
    assert_eq!(restores[1].amount, dec("7"));

    apply(&mut lots, &restores);
    assert_eq!(lots[0].quantity_on_hand, dec("7"));
    assert_eq!(lots[1].quantity_on_hand, dec("5"));
}

#[test]
fn test_insufficient_stock_commits_nothing() {
    let lots = vec![lot(dec("7")), lot(dec("5"))];

    let err = plan_deduction(&lots, dec("13")).unwrap_err();

    assert_eq!(
        err,
        LedgerError::InsufficientStock {
            required: dec("13"),
            available: dec("12"),
        }
    );
    // Planning failed, so nothing was drawn and the snapshots are untouched
    assert_eq!(lots[0].quantity_on_hand, dec("7"));
    assert_eq!(lots[1].quantity_on_hand, dec("5"));
}

#[test]
fn test_rollback_beyond_outstanding_is_a_defect() {
    let lot_id = Uuid::new_v4();
    let history = vec![
        LedgerEntry {
            lot_id,
            kind: TransactionKind::Deduction,
            amount: dec("3"),
        },
        LedgerEntry {
            lot_id,
            kind: TransactionKind::Rollback,
            amount: dec("5"),
        },
    ];
    let lots = vec![LotSnapshot {
        lot_id,
        quantity_on_hand: dec("10"),
        unit_price: dec("10000"),
    }];

    assert!(matches!(
        plan_restoration(&history, &lots),
        Err(LedgerError::OverRollback { .. })
    ));
}

#[test]
fn test_partial_rollback_history_restores_remainder_only() {
    let lot_a = lot(dec("7"));
    let lot_b = lot(dec("5"));
    let mut lots = vec![lot_a.clone(), lot_b.clone()];

    let deductions = plan_deduction(&lots, dec("10")).unwrap();
    apply(&mut lots, &deductions);

    // Lot B's 3 kg were already rolled back earlier
    let mut history = entries(&deductions, TransactionKind::Deduction);
    history.push(LedgerEntry {
        lot_id: lot_b.lot_id,
        kind: TransactionKind::Rollback,
        amount: dec("3"),
    });
    lots[1].quantity_on_hand = dec("5");

    let restores = plan_restoration(&history, &lots).unwrap();

    assert_eq!(restores.len(), 1);
    assert_eq!(restores[0].lot_id, lot_a.lot_id);
    assert_eq!(restores[0].amount, dec("7"));
}
