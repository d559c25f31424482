//! Inventory ledger service
//!
//! Sole writer of inventory_lots.quantity_on_hand. Every deduction and
//! rollback runs as one database transaction so the lot decrement and the
//! ledger append commit together; callers never mutate lots directly.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::ledger::{plan_deduction, plan_restoration, LedgerEntry, LedgerError, LotSnapshot};
use shared::models::{InventoryTransaction, TransactionKind};

/// Ledger service performing atomic lot deduction and restoration
#[derive(Clone)]
pub struct InventoryLedger {
    db: PgPool,
}

/// Database row for a ledger transaction
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TransactionRow {
    id: Uuid,
    seq: i64,
    batch_id: Uuid,
    material_id: Uuid,
    lot_id: Uuid,
    kind: String,
    amount: Decimal,
    unit_price_at_transaction: Decimal,
    quantity_before: Decimal,
    quantity_after: Decimal,
    performed_by: String,
    performed_at: DateTime<Utc>,
}

impl TransactionRow {
    pub(crate) fn into_transaction(self) -> AppResult<InventoryTransaction> {
        let kind = TransactionKind::from_str(&self.kind)
            .ok_or_else(|| AppError::InternalError(anyhow!("unknown transaction kind: {}", self.kind)))?;
        Ok(InventoryTransaction {
            id: self.id,
            seq: self.seq,
            batch_id: self.batch_id,
            material_id: self.material_id,
            lot_id: self.lot_id,
            kind,
            amount: self.amount,
            unit_price_at_transaction: self.unit_price_at_transaction,
            quantity_before: self.quantity_before,
            quantity_after: self.quantity_after,
            performed_by: self.performed_by,
            performed_at: self.performed_at,
        })
    }
}

const RETURNING_TRANSACTION: &str = r#"
    RETURNING id, seq, batch_id, material_id, lot_id, kind, amount,
              unit_price_at_transaction, quantity_before, quantity_after,
              performed_by, performed_at
"#;

impl InventoryLedger {
    /// Create a new InventoryLedger instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Deduct `required_amount` of a material for a batch
    ///
    /// All-or-nothing for the material: on insufficient stock nothing is
    /// committed and the shortfall is surfaced.
    pub async fn deduct(
        &self,
        batch_id: Uuid,
        material_id: Uuid,
        required_amount: Decimal,
        performed_by: &str,
    ) -> AppResult<Vec<InventoryTransaction>> {
        let mut tx = self.db.begin().await?;
        let transactions =
            Self::deduct_in(&mut tx, batch_id, material_id, required_amount, performed_by).await?;
        tx.commit().await?;
        Ok(transactions)
    }

    /// Roll back all outstanding consumption of a material for a batch
    ///
    /// Idempotent: once everything is restored, further calls return an
    /// empty transaction list.
    pub async fn rollback(
        &self,
        batch_id: Uuid,
        material_id: Uuid,
        performed_by: &str,
    ) -> AppResult<Vec<InventoryTransaction>> {
        let mut tx = self.db.begin().await?;
        let transactions =
            Self::rollback_in(&mut tx, batch_id, material_id, performed_by).await?;
        tx.commit().await?;
        Ok(transactions)
    }

    /// Deduction step composable into a caller's transaction
    pub(crate) async fn deduct_in(
        conn: &mut PgConnection,
        batch_id: Uuid,
        material_id: Uuid,
        required_amount: Decimal,
        performed_by: &str,
    ) -> AppResult<Vec<InventoryTransaction>> {
        let material_name = Self::material_name(&mut *conn, material_id).await?;
        let snapshots = Self::lock_lots(&mut *conn, material_id).await?;

        let movements = plan_deduction(&snapshots, required_amount)
            .map_err(|err| Self::ledger_error(err, &material_name, batch_id, material_id))?;

        let mut transactions = Vec::with_capacity(movements.len());
        for movement in &movements {
            sqlx::query(
                "UPDATE inventory_lots SET quantity_on_hand = $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(movement.quantity_after)
            .bind(movement.lot_id)
            .execute(&mut *conn)
            .await?;

            let row = sqlx::query_as::<_, TransactionRow>(&format!(
                r#"
                INSERT INTO inventory_transactions (
                    batch_id, material_id, lot_id, kind, amount,
                    unit_price_at_transaction, quantity_before, quantity_after,
                    performed_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                {}
                "#,
                RETURNING_TRANSACTION
            ))
            .bind(batch_id)
            .bind(material_id)
            .bind(movement.lot_id)
            .bind(TransactionKind::Deduction.as_str())
            .bind(movement.amount)
            .bind(movement.unit_price)
            .bind(movement.quantity_before)
            .bind(movement.quantity_after)
            .bind(performed_by)
            .fetch_one(&mut *conn)
            .await?;

            transactions.push(row.into_transaction()?);
        }

        tracing::debug!(
            "Deducted {} of material {} for batch {} across {} lot(s)",
            required_amount,
            material_id,
            batch_id,
            transactions.len()
        );

        Ok(transactions)
    }

    /// Rollback step composable into a caller's transaction
    pub(crate) async fn rollback_in(
        conn: &mut PgConnection,
        batch_id: Uuid,
        material_id: Uuid,
        performed_by: &str,
    ) -> AppResult<Vec<InventoryTransaction>> {
        let material_name = Self::material_name(&mut *conn, material_id).await?;
        // Lock before reading the history so no deduction for this material
        // can interleave between planning and applying the restoration
        let snapshots = Self::lock_lots(&mut *conn, material_id).await?;

        let history = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, seq, batch_id, material_id, lot_id, kind, amount,
                   unit_price_at_transaction, quantity_before, quantity_after,
                   performed_by, performed_at
            FROM inventory_transactions
            WHERE batch_id = $1 AND material_id = $2
            ORDER BY seq
            "#,
        )
        .bind(batch_id)
        .bind(material_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut entries = Vec::with_capacity(history.len());
        for row in history {
            let transaction = row.into_transaction()?;
            entries.push(LedgerEntry::from(&transaction));
        }

        let movements = plan_restoration(&entries, &snapshots)
            .map_err(|err| Self::ledger_error(err, &material_name, batch_id, material_id))?;

        if movements.is_empty() {
            return Ok(Vec::new());
        }

        let mut transactions = Vec::with_capacity(movements.len());
        for movement in &movements {
            sqlx::query(
                "UPDATE inventory_lots SET quantity_on_hand = $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(movement.quantity_after)
            .bind(movement.lot_id)
            .execute(&mut *conn)
            .await?;

            let row = sqlx::query_as::<_, TransactionRow>(&format!(
                r#"
                INSERT INTO inventory_transactions (
                    batch_id, material_id, lot_id, kind, amount,
                    unit_price_at_transaction, quantity_before, quantity_after,
                    performed_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                {}
                "#,
                RETURNING_TRANSACTION
            ))
            .bind(batch_id)
            .bind(material_id)
            .bind(movement.lot_id)
            .bind(TransactionKind::Rollback.as_str())
            .bind(movement.amount)
            .bind(movement.unit_price)
            .bind(movement.quantity_before)
            .bind(movement.quantity_after)
            .bind(performed_by)
            .fetch_one(&mut *conn)
            .await?;

            transactions.push(row.into_transaction()?);
        }

        tracing::debug!(
            "Rolled back material {} for batch {} across {} lot(s)",
            material_id,
            batch_id,
            transactions.len()
        );

        Ok(transactions)
    }

    /// Materials a batch has ledger transactions for, in first-deduction order
    pub(crate) async fn transacted_materials(
        conn: &mut PgConnection,
        batch_id: Uuid,
    ) -> AppResult<Vec<Uuid>> {
        let materials = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT material_id
            FROM inventory_transactions
            WHERE batch_id = $1
            GROUP BY material_id
            ORDER BY MIN(seq)
            "#,
        )
        .bind(batch_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(materials)
    }

    async fn material_name(conn: &mut PgConnection, material_id: Uuid) -> AppResult<String> {
        sqlx::query_scalar::<_, String>("SELECT name FROM materials WHERE id = $1")
            .bind(material_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Material".to_string()))
    }

    /// Lock the material's lots oldest-received first
    ///
    /// Every ledger operation takes the locks in this order, which
    /// serializes operations per material without deadlocking.
    async fn lock_lots(
        conn: &mut PgConnection,
        material_id: Uuid,
    ) -> AppResult<Vec<LotSnapshot>> {
        let rows = sqlx::query_as::<_, (Uuid, Decimal, Decimal)>(
            r#"
            SELECT id, quantity_on_hand, unit_price
            FROM inventory_lots
            WHERE material_id = $1
            ORDER BY received_at, id
            FOR UPDATE
            "#,
        )
        .bind(material_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(lot_id, quantity_on_hand, unit_price)| LotSnapshot {
                lot_id,
                quantity_on_hand,
                unit_price,
            })
            .collect())
    }

    fn ledger_error(
        err: LedgerError,
        material_name: &str,
        batch_id: Uuid,
        material_id: Uuid,
    ) -> AppError {
        match err {
            LedgerError::InsufficientStock {
                required,
                available,
            } => AppError::InsufficientStock {
                material: material_name.to_string(),
                required,
                available,
            },
            LedgerError::NonPositiveAmount(amount) => AppError::Validation {
                field: "required_amount".to_string(),
                message: format!("Required amount must be positive, got {}", amount),
                message_id: "Jumlah yang dibutuhkan harus positif".to_string(),
            },
            LedgerError::OverRollback { .. } => {
                tracing::error!(
                    "Ledger defect for batch {}, material {}: {}",
                    batch_id,
                    material_id,
                    err
                );
                AppError::OverRollback {
                    batch_id,
                    material_id,
                    detail: err.to_string(),
                }
            }
            LedgerError::UnknownLot(lot_id) => {
                AppError::InternalError(anyhow!("ledger references unknown lot {}", lot_id))
            }
        }
    }
}
