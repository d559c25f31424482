//! HTTP handlers for production batch management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::batch::{
    CancelBatchInput, CreateBatchInput, FailQualityInput, ProductionBatchService, ScalePreview,
    ScalePreviewInput, SubmitQualityInput,
};
use crate::services::consumption::{ConsumptionReport, ConsumptionReportService};
use crate::AppState;
use shared::models::{InventoryTransaction, ProductionBatch};
use shared::types::Pagination;

/// Preview the scaled ingredient list for a recipe without committing stock
pub async fn scale_preview(
    State(state): State<AppState>,
    Json(input): Json<ScalePreviewInput>,
) -> AppResult<Json<ScalePreview>> {
    let service = ProductionBatchService::new(state.db);
    let preview = service.scale_preview(input).await?;
    Ok(Json(preview))
}

/// Create a batch from a recipe, reserving inventory
pub async fn create_batch(
    State(state): State<AppState>,
    Json(input): Json<CreateBatchInput>,
) -> AppResult<impl IntoResponse> {
    let service = ProductionBatchService::new(state.db);
    let batch = service.create_batch(input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Get a batch by ID
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<ProductionBatch>> {
    let service = ProductionBatchService::new(state.db);
    let batch = service.get_batch(batch_id).await?;
    Ok(Json(batch))
}

/// List batches, newest first
pub async fn list_batches(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<ProductionBatch>>> {
    let service = ProductionBatchService::new(state.db);
    let batches = service.list_batches(pagination).await?;
    Ok(Json(batches))
}

/// Start production on a reserved batch
pub async fn start_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<ProductionBatch>> {
    let service = ProductionBatchService::new(state.db);
    let batch = service.start(batch_id).await?;
    Ok(Json(batch))
}

/// Record actual output and submit the batch to quality check
pub async fn submit_quality(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<SubmitQualityInput>,
) -> AppResult<Json<ProductionBatch>> {
    let service = ProductionBatchService::new(state.db);
    let batch = service.submit_quality(batch_id, input).await?;
    Ok(Json(batch))
}

/// Pass quality check and complete the batch
pub async fn complete_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<ProductionBatch>> {
    let service = ProductionBatchService::new(state.db);
    let batch = service.pass_quality(batch_id).await?;
    Ok(Json(batch))
}

/// Fail quality check, rejecting the batch and restoring stock
pub async fn reject_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<FailQualityInput>,
) -> AppResult<Json<ProductionBatch>> {
    let service = ProductionBatchService::new(state.db);
    let batch = service.fail_quality(batch_id, input).await?;
    Ok(Json(batch))
}

/// Cancel a batch, restoring any consumed stock
pub async fn cancel_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<CancelBatchInput>,
) -> AppResult<Json<ProductionBatch>> {
    let service = ProductionBatchService::new(state.db);
    let batch = service.cancel(batch_id, input).await?;
    Ok(Json(batch))
}

/// Get the consumption report for a batch
pub async fn get_batch_consumption(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<ConsumptionReport>> {
    let service = ConsumptionReportService::new(state.db);
    let report = service.report(batch_id).await?;
    Ok(Json(report))
}

/// Get the raw transaction log for a batch
pub async fn get_batch_transactions(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryTransaction>>> {
    let service = ConsumptionReportService::new(state.db);
    let transactions = service.transactions(batch_id).await?;
    Ok(Json(transactions))
}
