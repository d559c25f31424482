//! HTTP handlers for the School Meal Production Platform

pub mod batch;
pub mod health;
pub mod inventory;
pub mod material;
pub mod recipe;

pub use batch::*;
pub use health::*;
pub use inventory::*;
pub use material::*;
pub use recipe::*;
