//! Shared types and domain logic for the School Meal Production Platform
//!
//! This crate contains the models and pure domain rules (recipe scaling,
//! inventory ledger planning, batch state machine) shared between the
//! backend and other components of the system.

pub mod ledger;
pub mod models;
pub mod scaling;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use scaling::*;
pub use types::*;
pub use validation::*;
