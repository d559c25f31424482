//! Inventory lot service
//!
//! Lot receiving is the procurement entry point. Once received, a lot's
//! quantity only changes through the inventory ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::InventoryLot;
use shared::validation::{validate_quantity, validate_unit_price};

/// Inventory service for lot receiving and lookup
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Database row for an inventory lot
#[derive(Debug, sqlx::FromRow)]
struct LotRow {
    id: Uuid,
    material_id: Uuid,
    quantity_on_hand: Decimal,
    unit_price: Decimal,
    supplier: Option<String>,
    lot_number: Option<String>,
    received_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LotRow> for InventoryLot {
    fn from(row: LotRow) -> Self {
        InventoryLot {
            id: row.id,
            material_id: row.material_id,
            quantity_on_hand: row.quantity_on_hand,
            unit_price: row.unit_price,
            supplier: row.supplier,
            lot_number: row.lot_number,
            received_at: row.received_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for receiving a lot into stock
#[derive(Debug, Deserialize)]
pub struct ReceiveLotInput {
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub supplier: Option<String>,
    pub lot_number: Option<String>,
    /// Defaults to now; back-dated receipts keep FIFO ordering honest
    pub received_at: Option<DateTime<Utc>>,
}

const SELECT_LOT: &str = r#"
    SELECT id, material_id, quantity_on_hand, unit_price, supplier, lot_number,
           received_at, created_at, updated_at
    FROM inventory_lots
"#;

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Receive a new lot into stock
    pub async fn receive_lot(&self, input: ReceiveLotInput) -> AppResult<InventoryLot> {
        validate_quantity(input.quantity).map_err(|message| AppError::Validation {
            field: "quantity".to_string(),
            message: message.to_string(),
            message_id: "Jumlah harus positif".to_string(),
        })?;

        validate_unit_price(input.unit_price).map_err(|message| AppError::Validation {
            field: "unit_price".to_string(),
            message: message.to_string(),
            message_id: "Harga satuan tidak boleh negatif".to_string(),
        })?;

        let material_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM materials WHERE id = $1)",
        )
        .bind(input.material_id)
        .fetch_one(&self.db)
        .await?;

        if !material_exists {
            return Err(AppError::NotFound("Material".to_string()));
        }

        let row = sqlx::query_as::<_, LotRow>(
            r#"
            INSERT INTO inventory_lots (
                material_id, quantity_on_hand, unit_price, supplier, lot_number, received_at
            )
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()))
            RETURNING id, material_id, quantity_on_hand, unit_price, supplier, lot_number,
                      received_at, created_at, updated_at
            "#,
        )
        .bind(input.material_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(&input.supplier)
        .bind(&input.lot_number)
        .bind(input.received_at)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a lot by ID
    pub async fn get_lot(&self, lot_id: Uuid) -> AppResult<InventoryLot> {
        let row = sqlx::query_as::<_, LotRow>(&format!("{} WHERE id = $1", SELECT_LOT))
            .bind(lot_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory lot".to_string()))?;

        Ok(row.into())
    }

    /// List lots, optionally restricted to one material, oldest received first
    pub async fn list_lots(&self, material_id: Option<Uuid>) -> AppResult<Vec<InventoryLot>> {
        let rows = match material_id {
            Some(material_id) => {
                sqlx::query_as::<_, LotRow>(&format!(
                    "{} WHERE material_id = $1 ORDER BY received_at, id",
                    SELECT_LOT
                ))
                .bind(material_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, LotRow>(&format!("{} ORDER BY received_at, id", SELECT_LOT))
                    .fetch_all(&self.db)
                    .await?
            }
        };

        Ok(rows.into_iter().map(InventoryLot::from).collect())
    }
}
