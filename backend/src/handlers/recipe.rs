//! HTTP handlers for recipe management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::recipe::{CreateRecipeInput, RecipeService, RecipeWithIngredients};
use crate::AppState;
use shared::models::Recipe;

/// Create a recipe with its ingredient lines
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(input): Json<CreateRecipeInput>,
) -> AppResult<impl IntoResponse> {
    let service = RecipeService::new(state.db);
    let recipe = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Get a recipe with its ingredients
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<RecipeWithIngredients>> {
    let service = RecipeService::new(state.db);
    let recipe = service.get(recipe_id).await?;
    Ok(Json(recipe))
}

/// List all recipes
pub async fn list_recipes(State(state): State<AppState>) -> AppResult<Json<Vec<Recipe>>> {
    let service = RecipeService::new(state.db);
    let recipes = service.list().await?;
    Ok(Json(recipes))
}
