//! Production batch models and lifecycle state machine

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A production run of one recipe scaled to a target portion count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub id: Uuid,
    pub recipe_id: Uuid,
    /// Human-readable code (e.g., "SMP-2026-0042")
    pub batch_code: String,
    pub target_portions: i32,
    /// target_portions / reference_servings, fixed at creation and never
    /// recomputed, even if the recipe is edited afterwards
    pub scaling_factor: Decimal,
    pub status: BatchStatus,
    pub planned_quantity: Decimal,
    pub actual_quantity: Option<Decimal>,
    pub scheduled_date: NaiveDate,
    pub notes: Option<String>,
    pub requested_by: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a production batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Draft,
    InventoryReserved,
    InProgress,
    QualityCheck,
    Completed,
    Rejected,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Draft => "draft",
            BatchStatus::InventoryReserved => "inventory_reserved",
            BatchStatus::InProgress => "in_progress",
            BatchStatus::QualityCheck => "quality_check",
            BatchStatus::Completed => "completed",
            BatchStatus::Rejected => "rejected",
            BatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(BatchStatus::Draft),
            "inventory_reserved" => Some(BatchStatus::InventoryReserved),
            "in_progress" => Some(BatchStatus::InProgress),
            "quality_check" => Some(BatchStatus::QualityCheck),
            "completed" => Some(BatchStatus::Completed),
            "rejected" => Some(BatchStatus::Rejected),
            "cancelled" => Some(BatchStatus::Cancelled),
            _ => None,
        }
    }

    /// Completed, rejected and cancelled batches accept no further events
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::Rejected | BatchStatus::Cancelled
        )
    }

    /// Apply a lifecycle event, returning the next status
    ///
    /// Total over (status, event): every pair not in the transition table
    /// fails with [`TransitionError`] instead of silently no-op-ing.
    pub fn apply(self, event: BatchEvent) -> Result<BatchStatus, TransitionError> {
        use BatchEvent::*;
        use BatchStatus::*;

        match (self, event) {
            (Draft, Reserve) => Ok(InventoryReserved),
            (InventoryReserved, Start) => Ok(InProgress),
            (InProgress, SubmitQuality) => Ok(QualityCheck),
            (QualityCheck, PassQuality) => Ok(Completed),
            (QualityCheck, FailQuality) => Ok(Rejected),
            (Draft | InventoryReserved | InProgress | QualityCheck, Cancel) => Ok(Cancelled),
            (from, attempted) => Err(TransitionError { from, attempted }),
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle events a batch can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchEvent {
    Reserve,
    Start,
    SubmitQuality,
    PassQuality,
    FailQuality,
    Cancel,
}

impl BatchEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchEvent::Reserve => "reserve",
            BatchEvent::Start => "start",
            BatchEvent::SubmitQuality => "submit_quality",
            BatchEvent::PassQuality => "pass_quality",
            BatchEvent::FailQuality => "fail_quality",
            BatchEvent::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for BatchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event was applied to a status that does not accept it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply '{attempted}' to a batch in status '{from}'")]
pub struct TransitionError {
    pub from: BatchStatus,
    pub attempted: BatchEvent,
}

/// Generate a batch code
pub fn generate_batch_code(year: i32, sequence: i64) -> String {
    format!("SMP-{}-{:04}", year, sequence)
}
