//! Consumption reporting service
//!
//! Read-only aggregation over the inventory transaction log. The log is the
//! sole source of truth for what a batch consumed; a batch with no
//! transactions yields empty aggregates.

use std::collections::HashMap;

use serde::Serialize;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::TransactionRow;
use shared::ledger::{summarize_consumption, ConsumptionTotals};
use shared::models::InventoryTransaction;

/// Consumption report service
#[derive(Clone)]
pub struct ConsumptionReportService {
    db: PgPool,
}

/// Consumption of one material by a batch
#[derive(Debug, Clone, Serialize)]
pub struct MaterialConsumption {
    pub material_id: Uuid,
    pub material_name: String,
    pub deducted_quantity: Decimal,
    pub rolled_back_quantity: Decimal,
    pub net_quantity: Decimal,
    pub deducted_value: Decimal,
    pub rolled_back_value: Decimal,
    pub net_value: Decimal,
}

/// Full consumption report for a batch
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionReport {
    pub batch_id: Uuid,
    pub currency: String,
    pub materials: Vec<MaterialConsumption>,
    pub summary: ConsumptionTotals,
}

impl ConsumptionReportService {
    /// Create a new ConsumptionReportService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Aggregate the batch's transaction log into a consumption report
    pub async fn report(&self, batch_id: Uuid) -> AppResult<ConsumptionReport> {
        self.ensure_batch_exists(batch_id).await?;

        let transactions = self.fetch_transactions(batch_id).await?;
        let (totals, summary) = summarize_consumption(&transactions);

        let material_ids: Vec<Uuid> = totals.iter().map(|t| t.material_id).collect();
        let names = self.material_names(&material_ids).await?;

        let materials = totals
            .into_iter()
            .map(|t| MaterialConsumption {
                material_id: t.material_id,
                material_name: names
                    .get(&t.material_id)
                    .cloned()
                    .unwrap_or_else(|| t.material_id.to_string()),
                deducted_quantity: t.deducted_quantity,
                rolled_back_quantity: t.rolled_back_quantity,
                net_quantity: t.net_quantity,
                deducted_value: t.deducted_value,
                rolled_back_value: t.rolled_back_value,
                net_value: t.net_value,
            })
            .collect();

        Ok(ConsumptionReport {
            batch_id,
            currency: "IDR".to_string(),
            materials,
            summary,
        })
    }

    /// Raw transaction log for a batch, in ledger order
    pub async fn transactions(&self, batch_id: Uuid) -> AppResult<Vec<InventoryTransaction>> {
        self.ensure_batch_exists(batch_id).await?;
        self.fetch_transactions(batch_id).await
    }

    async fn fetch_transactions(&self, batch_id: Uuid) -> AppResult<Vec<InventoryTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, seq, batch_id, material_id, lot_id, kind, amount,
                   unit_price_at_transaction, quantity_before, quantity_after,
                   performed_by, performed_at
            FROM inventory_transactions
            WHERE batch_id = $1
            ORDER BY seq
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    async fn ensure_batch_exists(&self, batch_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM production_batches WHERE id = $1)",
        )
        .bind(batch_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Batch".to_string()));
        }
        Ok(())
    }

    async fn material_names(&self, material_ids: &[Uuid]) -> AppResult<HashMap<Uuid, String>> {
        if material_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM materials WHERE id = ANY($1)",
        )
        .bind(material_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
