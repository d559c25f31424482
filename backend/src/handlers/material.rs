//! HTTP handlers for the material catalog

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::material::{CreateMaterialInput, MaterialAvailability, MaterialService};
use crate::AppState;
use shared::models::Material;

/// Create a material
pub async fn create_material(
    State(state): State<AppState>,
    Json(input): Json<CreateMaterialInput>,
) -> AppResult<impl IntoResponse> {
    let service = MaterialService::new(state.db);
    let material = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

/// Get a material by ID
pub async fn get_material(
    State(state): State<AppState>,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<Material>> {
    let service = MaterialService::new(state.db);
    let material = service.get(material_id).await?;
    Ok(Json(material))
}

/// List all materials
pub async fn list_materials(State(state): State<AppState>) -> AppResult<Json<Vec<Material>>> {
    let service = MaterialService::new(state.db);
    let materials = service.list().await?;
    Ok(Json(materials))
}

/// Get on-hand availability for a material
pub async fn get_material_availability(
    State(state): State<AppState>,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<MaterialAvailability>> {
    let service = MaterialService::new(state.db);
    let availability = service.availability(material_id).await?;
    Ok(Json(availability))
}
