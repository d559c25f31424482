//! Material management service
//!
//! Materials are the catalog the recipe and inventory sides share: each one
//! carries the canonical unit its lots and recipe lines are expressed in.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Material, MaterialCategory};
use shared::types::Unit;
use shared::validation::validate_unit_price;

/// Material service for the shared material catalog
#[derive(Clone)]
pub struct MaterialService {
    db: PgPool,
}

/// Database row for a material
#[derive(Debug, sqlx::FromRow)]
struct MaterialRow {
    id: Uuid,
    name: String,
    category: String,
    unit: String,
    unit_price: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MaterialRow {
    fn into_material(self) -> AppResult<Material> {
        let category = MaterialCategory::from_str(&self.category)
            .ok_or_else(|| AppError::InternalError(anyhow!("unknown material category: {}", self.category)))?;
        let unit = Unit::from_str(&self.unit)
            .ok_or_else(|| AppError::InternalError(anyhow!("unknown unit: {}", self.unit)))?;
        Ok(Material {
            id: self.id,
            name: self.name,
            category,
            unit,
            unit_price: self.unit_price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Input for creating a material
#[derive(Debug, Deserialize)]
pub struct CreateMaterialInput {
    pub name: String,
    pub category: MaterialCategory,
    pub unit: Unit,
    pub unit_price: Option<Decimal>,
}

/// On-hand availability of one material across its lots
#[derive(Debug, Clone, Serialize)]
pub struct MaterialAvailability {
    pub material_id: Uuid,
    pub material_name: String,
    pub unit: Unit,
    pub total_on_hand: Decimal,
    pub lot_count: i64,
}

const RETURNING_MATERIAL: &str = r#"
    RETURNING id, name, category, unit, unit_price, created_at, updated_at
"#;

impl MaterialService {
    /// Create a new MaterialService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a material
    pub async fn create(&self, input: CreateMaterialInput) -> AppResult<Material> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Material name is required".to_string(),
                message_id: "Nama bahan wajib diisi".to_string(),
            });
        }

        if let Some(price) = input.unit_price {
            validate_unit_price(price).map_err(|message| AppError::Validation {
                field: "unit_price".to_string(),
                message: message.to_string(),
                message_id: "Harga satuan tidak boleh negatif".to_string(),
            })?;
        }

        let row = sqlx::query_as::<_, MaterialRow>(&format!(
            r#"
            INSERT INTO materials (name, category, unit, unit_price)
            VALUES ($1, $2, $3, $4)
            {}
            "#,
            RETURNING_MATERIAL
        ))
        .bind(input.name.trim())
        .bind(input.category.as_str())
        .bind(input.unit.as_str())
        .bind(input.unit_price)
        .fetch_one(&self.db)
        .await?;

        row.into_material()
    }

    /// Get a material by ID
    pub async fn get(&self, material_id: Uuid) -> AppResult<Material> {
        let row = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT id, name, category, unit, unit_price, created_at, updated_at
            FROM materials
            WHERE id = $1
            "#,
        )
        .bind(material_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Material".to_string()))?;

        row.into_material()
    }

    /// List all materials
    pub async fn list(&self) -> AppResult<Vec<Material>> {
        let rows = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT id, name, category, unit, unit_price, created_at, updated_at
            FROM materials
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MaterialRow::into_material).collect()
    }

    /// On-hand availability across the material's lots
    pub async fn availability(&self, material_id: Uuid) -> AppResult<MaterialAvailability> {
        let material = self.get(material_id).await?;

        let (total_on_hand, lot_count) = sqlx::query_as::<_, (Decimal, i64)>(
            r#"
            SELECT COALESCE(SUM(quantity_on_hand), 0), COUNT(*) FILTER (WHERE quantity_on_hand > 0)
            FROM inventory_lots
            WHERE material_id = $1
            "#,
        )
        .bind(material_id)
        .fetch_one(&self.db)
        .await?;

        Ok(MaterialAvailability {
            material_id: material.id,
            material_name: material.name,
            unit: material.unit,
            total_on_hand,
            lot_count,
        })
    }
}
