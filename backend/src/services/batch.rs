//! Production batch lifecycle service
//!
//! Orchestrates recipe scaling and the inventory ledger around the batch
//! state machine. Creation deducts stock for every scaled ingredient and
//! compensates already-deducted materials if any deduction fails, so a
//! batch is never left inventory-reserved with partial stock committed.
//! Cancellation and rejection restore stock atomically with the status
//! change; completion makes the consumption final.

use std::collections::HashMap;

use anyhow::anyhow;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::InventoryLedger;
use shared::models::{
    generate_batch_code, BatchEvent, BatchStatus, ProductionBatch, Recipe, RecipeIngredient,
};
use shared::scaling::scale_recipe;
use shared::types::{Pagination, Unit};
use shared::validation::validate_quantity;

/// Production batch service
#[derive(Clone)]
pub struct ProductionBatchService {
    db: PgPool,
}

/// Database row for a production batch
#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: Uuid,
    recipe_id: Uuid,
    batch_code: String,
    target_portions: i32,
    scaling_factor: Decimal,
    status: String,
    planned_quantity: Decimal,
    actual_quantity: Option<Decimal>,
    scheduled_date: NaiveDate,
    notes: Option<String>,
    requested_by: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BatchRow {
    fn into_batch(self) -> AppResult<ProductionBatch> {
        let status = BatchStatus::from_str(&self.status)
            .ok_or_else(|| AppError::InternalError(anyhow!("unknown batch status: {}", self.status)))?;
        Ok(ProductionBatch {
            id: self.id,
            recipe_id: self.recipe_id,
            batch_code: self.batch_code,
            target_portions: self.target_portions,
            scaling_factor: self.scaling_factor,
            status,
            planned_quantity: self.planned_quantity,
            actual_quantity: self.actual_quantity,
            scheduled_date: self.scheduled_date,
            notes: self.notes,
            requested_by: self.requested_by,
            started_at: self.started_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const RETURNING_BATCH: &str = r#"
    RETURNING id, recipe_id, batch_code, target_portions, scaling_factor, status,
              planned_quantity, actual_quantity, scheduled_date, notes, requested_by,
              started_at, completed_at, created_at, updated_at
"#;

/// Input for previewing a scaled recipe
#[derive(Debug, Deserialize)]
pub struct ScalePreviewInput {
    pub recipe_id: Uuid,
    pub target_portions: i32,
}

/// Input for creating a batch from a recipe
#[derive(Debug, Deserialize)]
pub struct CreateBatchInput {
    pub recipe_id: Uuid,
    pub target_portions: i32,
    pub scheduled_date: NaiveDate,
    pub notes: Option<String>,
    pub requested_by: String,
}

/// Input for submitting a batch to quality check
#[derive(Debug, Deserialize)]
pub struct SubmitQualityInput {
    pub actual_quantity: Decimal,
}

/// Input for rejecting a batch at quality check
#[derive(Debug, Deserialize)]
pub struct FailQualityInput {
    pub performed_by: String,
    pub notes: Option<String>,
}

/// Input for cancelling a batch
#[derive(Debug, Deserialize)]
pub struct CancelBatchInput {
    pub performed_by: String,
    pub notes: Option<String>,
}

/// One scaled ingredient, enriched for display
#[derive(Debug, Clone, Serialize)]
pub struct ScaledIngredientView {
    pub material_id: Uuid,
    pub material_name: String,
    pub unit: Unit,
    pub scaled_quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub estimated_cost: Option<Decimal>,
    pub cost_unknown: bool,
}

/// Scaling preview for a recipe and target portion count
#[derive(Debug, Clone, Serialize)]
pub struct ScalePreview {
    pub recipe_id: Uuid,
    pub recipe_name: String,
    pub reference_servings: i32,
    pub target_portions: i32,
    pub scaling_factor: Decimal,
    pub ingredients: Vec<ScaledIngredientView>,
    pub estimated_total_cost: Decimal,
    pub cost_is_lower_bound: bool,
    pub estimated_time_minutes: Option<i32>,
}

struct RecipeBundle {
    recipe: Recipe,
    ingredients: Vec<RecipeIngredient>,
    /// material_id -> (name, current unit price)
    materials: HashMap<Uuid, (String, Option<Decimal>)>,
}

impl ProductionBatchService {
    /// Create a new ProductionBatchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Preview the scaled ingredient list without touching inventory
    pub async fn scale_preview(&self, input: ScalePreviewInput) -> AppResult<ScalePreview> {
        let bundle = self.load_recipe_bundle(input.recipe_id).await?;
        let prices: HashMap<Uuid, Option<Decimal>> = bundle
            .materials
            .iter()
            .map(|(id, (_, price))| (*id, *price))
            .collect();

        let scaled = scale_recipe(
            &bundle.recipe,
            &bundle.ingredients,
            &prices,
            input.target_portions,
        )?;

        let ingredients = scaled
            .ingredients
            .iter()
            .map(|ingredient| {
                let material_name = bundle
                    .materials
                    .get(&ingredient.material_id)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_else(|| ingredient.material_id.to_string());
                ScaledIngredientView {
                    material_id: ingredient.material_id,
                    material_name,
                    unit: ingredient.unit,
                    scaled_quantity: ingredient.scaled_quantity,
                    unit_price: ingredient.unit_price,
                    estimated_cost: ingredient.estimated_cost,
                    cost_unknown: ingredient.cost_unknown,
                }
            })
            .collect();

        Ok(ScalePreview {
            recipe_id: bundle.recipe.id,
            recipe_name: bundle.recipe.name,
            reference_servings: bundle.recipe.reference_servings,
            target_portions: input.target_portions,
            scaling_factor: scaled.scaling_factor,
            ingredients,
            estimated_total_cost: scaled.estimated_total_cost,
            cost_is_lower_bound: scaled.cost_is_lower_bound,
            estimated_time_minutes: scaled.estimated_time_minutes,
        })
    }

    /// Create a batch from a recipe, reserving inventory for every ingredient
    pub async fn create_batch(&self, input: CreateBatchInput) -> AppResult<ProductionBatch> {
        if input.requested_by.trim().is_empty() {
            return Err(AppError::Validation {
                field: "requested_by".to_string(),
                message: "Requester name is required".to_string(),
                message_id: "Nama pemohon wajib diisi".to_string(),
            });
        }

        let bundle = self.load_recipe_bundle(input.recipe_id).await?;
        let prices: HashMap<Uuid, Option<Decimal>> = bundle
            .materials
            .iter()
            .map(|(id, (_, price))| (*id, *price))
            .collect();

        let scaled = scale_recipe(
            &bundle.recipe,
            &bundle.ingredients,
            &prices,
            input.target_portions,
        )?;

        let batch_code = self.next_batch_code(input.scheduled_date.year()).await?;

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            INSERT INTO production_batches (
                recipe_id, batch_code, target_portions, scaling_factor, status,
                planned_quantity, scheduled_date, notes, requested_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            {}
            "#,
            RETURNING_BATCH
        ))
        .bind(input.recipe_id)
        .bind(&batch_code)
        .bind(input.target_portions)
        .bind(scaled.scaling_factor)
        .bind(BatchStatus::Draft.as_str())
        .bind(Decimal::from(input.target_portions))
        .bind(input.scheduled_date)
        .bind(&input.notes)
        .bind(input.requested_by.trim())
        .fetch_one(&self.db)
        .await?;
        let batch_id = row.id;

        // Reserve stock one material at a time; each deduction is atomic
        // for its material, failures compensate the materials already taken
        let ledger = InventoryLedger::new(self.db.clone());
        let mut deducted: Vec<Uuid> = Vec::new();
        for ingredient in &scaled.ingredients {
            match ledger
                .deduct(
                    batch_id,
                    ingredient.material_id,
                    ingredient.scaled_quantity,
                    input.requested_by.trim(),
                )
                .await
            {
                Ok(_) => deducted.push(ingredient.material_id),
                Err(err) => {
                    self.compensate_failed_create(batch_id, &deducted, input.requested_by.trim())
                        .await;
                    return Err(err);
                }
            }
        }

        let status = BatchStatus::Draft.apply(BatchEvent::Reserve)?;
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE production_batches
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            {}
            "#,
            RETURNING_BATCH
        ))
        .bind(status.as_str())
        .bind(batch_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            "Created batch {} ({} portions of recipe {})",
            batch_code,
            input.target_portions,
            input.recipe_id
        );

        row.into_batch()
    }

    /// Start production on a reserved batch
    pub async fn start(&self, batch_id: Uuid) -> AppResult<ProductionBatch> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_batch(&mut tx, batch_id).await?;
        let next = current.apply(BatchEvent::Start)?;

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE production_batches
            SET status = $1, started_at = NOW(), updated_at = NOW()
            WHERE id = $2
            {}
            "#,
            RETURNING_BATCH
        ))
        .bind(next.as_str())
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_batch()
    }

    /// Record the actual output and submit the batch to quality check
    pub async fn submit_quality(
        &self,
        batch_id: Uuid,
        input: SubmitQualityInput,
    ) -> AppResult<ProductionBatch> {
        validate_quantity(input.actual_quantity).map_err(|message| AppError::Validation {
            field: "actual_quantity".to_string(),
            message: message.to_string(),
            message_id: "Jumlah aktual harus positif".to_string(),
        })?;

        let mut tx = self.db.begin().await?;
        let current = Self::lock_batch(&mut tx, batch_id).await?;
        let next = current.apply(BatchEvent::SubmitQuality)?;

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE production_batches
            SET status = $1, actual_quantity = $2, updated_at = NOW()
            WHERE id = $3
            {}
            "#,
            RETURNING_BATCH
        ))
        .bind(next.as_str())
        .bind(input.actual_quantity)
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_batch()
    }

    /// Pass quality check; consumed inventory becomes final
    pub async fn pass_quality(&self, batch_id: Uuid) -> AppResult<ProductionBatch> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_batch(&mut tx, batch_id).await?;
        let next = current.apply(BatchEvent::PassQuality)?;

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE production_batches
            SET status = $1, completed_at = NOW(), updated_at = NOW()
            WHERE id = $2
            {}
            "#,
            RETURNING_BATCH
        ))
        .bind(next.as_str())
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_batch()
    }

    /// Fail quality check, restoring the batch's consumed stock
    pub async fn fail_quality(
        &self,
        batch_id: Uuid,
        input: FailQualityInput,
    ) -> AppResult<ProductionBatch> {
        self.terminate_with_rollback(
            batch_id,
            BatchEvent::FailQuality,
            input.performed_by.trim(),
            input.notes,
            true,
        )
        .await
    }

    /// Cancel the batch, restoring any consumed stock
    pub async fn cancel(
        &self,
        batch_id: Uuid,
        input: CancelBatchInput,
    ) -> AppResult<ProductionBatch> {
        self.terminate_with_rollback(
            batch_id,
            BatchEvent::Cancel,
            input.performed_by.trim(),
            input.notes,
            false,
        )
        .await
    }

    /// Get a batch by ID
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<ProductionBatch> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, recipe_id, batch_code, target_portions, scaling_factor, status,
                   planned_quantity, actual_quantity, scheduled_date, notes, requested_by,
                   started_at, completed_at, created_at, updated_at
            FROM production_batches
            WHERE id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        row.into_batch()
    }

    /// List batches, newest first
    pub async fn list_batches(&self, pagination: Pagination) -> AppResult<Vec<ProductionBatch>> {
        let per_page = pagination.per_page.min(100) as i64;
        let offset = (pagination.page.max(1) as i64 - 1) * per_page;

        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, recipe_id, batch_code, target_portions, scaling_factor, status,
                   planned_quantity, actual_quantity, scheduled_date, notes, requested_by,
                   started_at, completed_at, created_at, updated_at
            FROM production_batches
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(BatchRow::into_batch).collect()
    }

    /// Apply a terminal failure event and restore stock in one transaction
    async fn terminate_with_rollback(
        &self,
        batch_id: Uuid,
        event: BatchEvent,
        performed_by: &str,
        notes: Option<String>,
        set_completed_at: bool,
    ) -> AppResult<ProductionBatch> {
        if performed_by.is_empty() {
            return Err(AppError::Validation {
                field: "performed_by".to_string(),
                message: "Performer name is required".to_string(),
                message_id: "Nama pelaksana wajib diisi".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let current = Self::lock_batch(&mut tx, batch_id).await?;
        let next = current.apply(event)?;

        // Every material with ledger activity, from the log rather than the
        // ingredient list, so a partially compensated creation stays covered
        let materials = InventoryLedger::transacted_materials(&mut tx, batch_id).await?;
        for material_id in materials {
            InventoryLedger::rollback_in(&mut tx, batch_id, material_id, performed_by).await?;
        }

        let completed_at_clause = if set_completed_at {
            "completed_at = NOW(),"
        } else {
            ""
        };
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE production_batches
            SET status = $1, {} notes = COALESCE($2, notes), updated_at = NOW()
            WHERE id = $3
            {}
            "#,
            completed_at_clause, RETURNING_BATCH
        ))
        .bind(next.as_str())
        .bind(&notes)
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Batch {} moved to {}", batch_id, next);

        row.into_batch()
    }

    /// Roll back already-deducted materials after a failed creation and
    /// park the batch in cancelled
    async fn compensate_failed_create(
        &self,
        batch_id: Uuid,
        deducted: &[Uuid],
        performed_by: &str,
    ) {
        let ledger = InventoryLedger::new(self.db.clone());
        for material_id in deducted {
            if let Err(err) = ledger.rollback(batch_id, *material_id, performed_by).await {
                tracing::error!(
                    "Compensation rollback failed for batch {}, material {}: {:?}",
                    batch_id,
                    material_id,
                    err
                );
            }
        }

        if let Err(err) = sqlx::query(
            "UPDATE production_batches SET status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(BatchStatus::Cancelled.as_str())
        .bind(batch_id)
        .execute(&self.db)
        .await
        {
            tracing::error!(
                "Failed to cancel batch {} after deduction failure: {:?}",
                batch_id,
                err
            );
        }
    }

    /// Lock the batch row, serializing transitions per batch
    async fn lock_batch(conn: &mut PgConnection, batch_id: Uuid) -> AppResult<BatchStatus> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM production_batches WHERE id = $1 FOR UPDATE",
        )
        .bind(batch_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        BatchStatus::from_str(&status)
            .ok_or_else(|| AppError::InternalError(anyhow!("unknown batch status: {}", status)))
    }

    async fn load_recipe_bundle(&self, recipe_id: Uuid) -> AppResult<RecipeBundle> {
        let recipe_row = sqlx::query_as::<_, (Uuid, String, i32, Option<i32>, Option<String>, DateTime<Utc>, DateTime<Utc>)>(
            r#"
            SELECT id, name, reference_servings, estimated_time_minutes, notes,
                   created_at, updated_at
            FROM recipes
            WHERE id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        let recipe = Recipe {
            id: recipe_row.0,
            name: recipe_row.1,
            reference_servings: recipe_row.2,
            estimated_time_minutes: recipe_row.3,
            notes: recipe_row.4,
            created_at: recipe_row.5,
            updated_at: recipe_row.6,
        };

        let ingredient_rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, Decimal, String)>(
            r#"
            SELECT id, recipe_id, material_id, reference_quantity, unit
            FROM recipe_ingredients
            WHERE recipe_id = $1
            ORDER BY id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await?;

        let mut ingredients = Vec::with_capacity(ingredient_rows.len());
        for (id, recipe_id, material_id, reference_quantity, unit) in ingredient_rows {
            let unit = Unit::from_str(&unit)
                .ok_or_else(|| AppError::InternalError(anyhow!("unknown unit: {}", unit)))?;
            ingredients.push(RecipeIngredient {
                id,
                recipe_id,
                material_id,
                reference_quantity,
                unit,
            });
        }

        let material_rows = sqlx::query_as::<_, (Uuid, String, Option<Decimal>)>(
            r#"
            SELECT m.id, m.name, m.unit_price
            FROM materials m
            JOIN recipe_ingredients ri ON ri.material_id = m.id
            WHERE ri.recipe_id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await?;

        let materials = material_rows
            .into_iter()
            .map(|(id, name, price)| (id, (name, price)))
            .collect();

        Ok(RecipeBundle {
            recipe,
            ingredients,
            materials,
        })
    }

    async fn next_batch_code(&self, year: i32) -> AppResult<String> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM production_batches WHERE EXTRACT(YEAR FROM scheduled_date)::int = $1",
        )
        .bind(year)
        .fetch_one(&self.db)
        .await?;

        Ok(generate_batch_code(year, count + 1))
    }
}
