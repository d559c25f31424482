//! Recipe read/write service
//!
//! Recipes are authored by the menu-planning side; production only reads
//! them. A batch stores its own scaling factor at creation, so later recipe
//! edits never change what a historical batch consumed.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Recipe, RecipeIngredient};
use shared::types::Unit;
use shared::validation::{validate_ingredient_unit, validate_quantity, validate_reference_servings};

/// Recipe service
#[derive(Clone)]
pub struct RecipeService {
    db: PgPool,
}

/// Database row for a recipe
#[derive(Debug, sqlx::FromRow)]
struct RecipeRow {
    id: Uuid,
    name: String,
    reference_servings: i32,
    estimated_time_minutes: Option<i32>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Recipe {
            id: row.id,
            name: row.name,
            reference_servings: row.reference_servings,
            estimated_time_minutes: row.estimated_time_minutes,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a recipe ingredient
#[derive(Debug, sqlx::FromRow)]
struct IngredientRow {
    id: Uuid,
    recipe_id: Uuid,
    material_id: Uuid,
    reference_quantity: Decimal,
    unit: String,
}

impl IngredientRow {
    fn into_ingredient(self) -> AppResult<RecipeIngredient> {
        let unit = Unit::from_str(&self.unit)
            .ok_or_else(|| AppError::InternalError(anyhow!("unknown unit: {}", self.unit)))?;
        Ok(RecipeIngredient {
            id: self.id,
            recipe_id: self.recipe_id,
            material_id: self.material_id,
            reference_quantity: self.reference_quantity,
            unit,
        })
    }
}

/// Input for creating a recipe
#[derive(Debug, Deserialize)]
pub struct CreateRecipeInput {
    pub name: String,
    pub reference_servings: i32,
    pub estimated_time_minutes: Option<i32>,
    pub notes: Option<String>,
    pub ingredients: Vec<RecipeIngredientInput>,
}

/// One ingredient line of a recipe being created
#[derive(Debug, Deserialize)]
pub struct RecipeIngredientInput {
    pub material_id: Uuid,
    pub reference_quantity: Decimal,
    pub unit: Unit,
}

/// A recipe with its ingredient lines
#[derive(Debug, Clone, Serialize)]
pub struct RecipeWithIngredients {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
}

impl RecipeService {
    /// Create a new RecipeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a recipe with its ingredient lines
    pub async fn create(&self, input: CreateRecipeInput) -> AppResult<RecipeWithIngredients> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Recipe name is required".to_string(),
                message_id: "Nama resep wajib diisi".to_string(),
            });
        }

        validate_reference_servings(input.reference_servings).map_err(|message| {
            AppError::Validation {
                field: "reference_servings".to_string(),
                message: message.to_string(),
                message_id: "Jumlah porsi acuan harus positif".to_string(),
            }
        })?;

        if input.ingredients.is_empty() {
            return Err(AppError::Validation {
                field: "ingredients".to_string(),
                message: "A recipe needs at least one ingredient".to_string(),
                message_id: "Resep membutuhkan minimal satu bahan".to_string(),
            });
        }

        // Validate each line against the material catalog before writing
        for ingredient in &input.ingredients {
            validate_quantity(ingredient.reference_quantity).map_err(|message| {
                AppError::Validation {
                    field: "reference_quantity".to_string(),
                    message: message.to_string(),
                    message_id: "Jumlah bahan harus positif".to_string(),
                }
            })?;

            let material_unit = sqlx::query_scalar::<_, String>(
                "SELECT unit FROM materials WHERE id = $1",
            )
            .bind(ingredient.material_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Material".to_string()))?;
            let material_unit = Unit::from_str(&material_unit)
                .ok_or_else(|| AppError::InternalError(anyhow!("unknown unit: {}", material_unit)))?;

            validate_ingredient_unit(ingredient.unit, material_unit).map_err(|message| {
                AppError::Validation {
                    field: "unit".to_string(),
                    message: message.to_string(),
                    message_id: "Satuan bahan harus sama dengan satuan kanonik material".to_string(),
                }
            })?;
        }

        let mut tx = self.db.begin().await?;

        let recipe_row = sqlx::query_as::<_, RecipeRow>(
            r#"
            INSERT INTO recipes (name, reference_servings, estimated_time_minutes, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, reference_servings, estimated_time_minutes, notes,
                      created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.reference_servings)
        .bind(input.estimated_time_minutes)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut ingredients = Vec::with_capacity(input.ingredients.len());
        for ingredient in &input.ingredients {
            let row = sqlx::query_as::<_, IngredientRow>(
                r#"
                INSERT INTO recipe_ingredients (recipe_id, material_id, reference_quantity, unit)
                VALUES ($1, $2, $3, $4)
                RETURNING id, recipe_id, material_id, reference_quantity, unit
                "#,
            )
            .bind(recipe_row.id)
            .bind(ingredient.material_id)
            .bind(ingredient.reference_quantity)
            .bind(ingredient.unit.as_str())
            .fetch_one(&mut *tx)
            .await?;
            ingredients.push(row.into_ingredient()?);
        }

        tx.commit().await?;

        Ok(RecipeWithIngredients {
            recipe: recipe_row.into(),
            ingredients,
        })
    }

    /// Get a recipe with its ingredients
    pub async fn get(&self, recipe_id: Uuid) -> AppResult<RecipeWithIngredients> {
        let recipe_row = sqlx::query_as::<_, RecipeRow>(
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

        let ingredient_rows = sqlx::query_as::<_, IngredientRow>(
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

        let ingredients = ingredient_rows
            .into_iter()
            .map(IngredientRow::into_ingredient)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(RecipeWithIngredients {
            recipe: recipe_row.into(),
            ingredients,
        })
    }

    /// List all recipes
    pub async fn list(&self) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, name, reference_servings, estimated_time_minutes, notes,
                   created_at, updated_at
            FROM recipes
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }
}
