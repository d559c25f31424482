//! Error handling for the School Meal Production Platform
//!
//! Provides consistent error responses in Indonesian and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use shared::{BatchEvent, BatchStatus, ScalingError, TransitionError};

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_id: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid scaling input: {message}")]
    InvalidScalingInput { message: String, message_id: String },

    #[error("Insufficient stock for {material}: required {required}, available {available}")]
    InsufficientStock {
        material: String,
        required: Decimal,
        available: Decimal,
    },

    /// The lifecycle asked the ledger to restore more than was deducted.
    /// Indicates a defect in transition ordering, not a business condition.
    #[error("Over-rollback for batch {batch_id}, material {material_id}: {detail}")]
    OverRollback {
        batch_id: Uuid,
        material_id: Uuid,
        detail: String,
    },

    #[error("Invalid state transition: cannot apply '{attempted}' in status '{from}'")]
    InvalidTransition {
        from: BatchStatus,
        attempted: BatchEvent,
    },

    // Transient errors - safe to retry with backoff
    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_id: String,
    },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Serialization failures and deadlocks are retryable; surface them
        // as Conflict so callers can distinguish "retry" from "fail"
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(code) = db_err.code() {
                if code == "40001" || code == "40P01" {
                    return AppError::Conflict {
                        resource: "database".to_string(),
                        message: "Concurrent update conflict, retry the operation".to_string(),
                        message_id: "Konflik pembaruan bersamaan, ulangi operasi".to_string(),
                    };
                }
            }
        }
        AppError::DatabaseError(err)
    }
}

impl From<ScalingError> for AppError {
    fn from(err: ScalingError) -> Self {
        let message_id = match err {
            ScalingError::NonPositiveTargetPortions => "Jumlah porsi target harus positif",
            ScalingError::NonPositiveReferenceServings => "Jumlah porsi acuan resep harus positif",
        };
        AppError::InvalidScalingInput {
            message: err.to_string(),
            message_id: message_id.to_string(),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::InvalidTransition {
            from: err.from,
            attempted: err.attempted,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<StockShortfall>,
}

/// Structured shortfall so the UI can explain an insufficient-stock failure
/// without parsing messages
#[derive(Serialize)]
pub struct StockShortfall {
    pub material: String,
    pub required: Decimal,
    pub available: Decimal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_id,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_id: message_id.clone(),
                    field: Some(field.clone()),
                    shortfall: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_id: format!("{} tidak ditemukan", resource),
                    field: None,
                    shortfall: None,
                },
            ),
            AppError::InvalidScalingInput {
                message,
                message_id,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_SCALING_INPUT".to_string(),
                    message_en: message.clone(),
                    message_id: message_id.clone(),
                    field: None,
                    shortfall: None,
                },
            ),
            AppError::InsufficientStock {
                material,
                required,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient stock for {}: required {}, available {}",
                        material, required, available
                    ),
                    message_id: format!(
                        "Stok {} tidak mencukupi: dibutuhkan {}, tersedia {}",
                        material, required, available
                    ),
                    field: None,
                    shortfall: Some(StockShortfall {
                        material: material.clone(),
                        required: *required,
                        available: *available,
                    }),
                },
            ),
            AppError::OverRollback {
                batch_id,
                material_id,
                detail,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "OVER_ROLLBACK".to_string(),
                    message_en: format!(
                        "Rollback exceeded outstanding consumption for batch {}, material {}: {}",
                        batch_id, material_id, detail
                    ),
                    message_id: format!(
                        "Pengembalian melebihi konsumsi tercatat untuk batch {}, bahan {}",
                        batch_id, material_id
                    ),
                    field: None,
                    shortfall: None,
                },
            ),
            AppError::InvalidTransition { from, attempted } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_TRANSITION".to_string(),
                    message_en: format!(
                        "Cannot apply '{}' to a batch in status '{}'",
                        attempted, from
                    ),
                    message_id: format!(
                        "Tidak dapat menerapkan '{}' pada batch berstatus '{}'",
                        attempted, from
                    ),
                    field: None,
                    shortfall: None,
                },
            ),
            AppError::Conflict {
                resource,
                message,
                message_id,
            } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message_en: message.clone(),
                    message_id: message_id.clone(),
                    field: Some(resource.clone()),
                    shortfall: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_id: "Terjadi kesalahan basis data".to_string(),
                    field: None,
                    shortfall: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_id: "Terjadi kesalahan internal server".to_string(),
                    field: None,
                    shortfall: None,
                },
            ),
        };

        // Log the error for debugging; over-rollbacks are defects
        if matches!(self, AppError::OverRollback { .. }) {
            tracing::error!("Defect: {:?}", self);
        } else {
            tracing::error!("Error: {:?}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
