//! HTTP handlers for inventory lot management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::inventory::{InventoryService, ReceiveLotInput};
use crate::AppState;
use shared::models::InventoryLot;

/// Query parameters for listing lots
#[derive(Debug, Deserialize)]
pub struct ListLotsQuery {
    pub material_id: Option<Uuid>,
}

/// Receive a new lot into stock
pub async fn receive_lot(
    State(state): State<AppState>,
    Json(input): Json<ReceiveLotInput>,
) -> AppResult<impl IntoResponse> {
    let service = InventoryService::new(state.db);
    let lot = service.receive_lot(input).await?;
    Ok((StatusCode::CREATED, Json(lot)))
}

/// Get a lot by ID
pub async fn get_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<InventoryLot>> {
    let service = InventoryService::new(state.db);
    let lot = service.get_lot(lot_id).await?;
    Ok(Json(lot))
}

/// List lots, optionally filtered by material
pub async fn list_lots(
    State(state): State<AppState>,
    Query(query): Query<ListLotsQuery>,
) -> AppResult<Json<Vec<InventoryLot>>> {
    let service = InventoryService::new(state.db);
    let lots = service.list_lots(query.material_id).await?;
    Ok(Json(lots))
}
