//! Business logic services for the School Meal Production Platform

pub mod batch;
pub mod consumption;
pub mod inventory;
pub mod ledger;
pub mod material;
pub mod recipe;

pub use batch::ProductionBatchService;
pub use consumption::ConsumptionReportService;
pub use inventory::InventoryService;
pub use ledger::InventoryLedger;
pub use material::MaterialService;
pub use recipe::RecipeService;
