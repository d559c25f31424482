//! Route definitions for the School Meal Production Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Material catalog
        .nest("/materials", material_routes())
        // Recipe management
        .nest("/recipes", recipe_routes())
        // Inventory lot management
        .nest("/inventory", inventory_routes())
        // Production batch management
        .nest("/batches", batch_routes())
}

/// Material catalog routes
fn material_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_materials).post(handlers::create_material))
        .route("/:material_id", get(handlers::get_material))
        .route("/:material_id/availability", get(handlers::get_material_availability))
}

/// Recipe management routes
fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_recipes).post(handlers::create_recipe))
        .route("/:recipe_id", get(handlers::get_recipe))
}

/// Inventory lot routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/lots", get(handlers::list_lots).post(handlers::receive_lot))
        .route("/lots/:lot_id", get(handlers::get_lot))
}

/// Production batch routes
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_batches).post(handlers::create_batch))
        .route("/scale-preview", post(handlers::scale_preview))
        .route("/:batch_id", get(handlers::get_batch))
        .route("/:batch_id/start", post(handlers::start_batch))
        .route("/:batch_id/quality-check", post(handlers::submit_quality))
        .route("/:batch_id/complete", post(handlers::complete_batch))
        .route("/:batch_id/reject", post(handlers::reject_batch))
        .route("/:batch_id/cancel", post(handlers::cancel_batch))
        .route("/:batch_id/consumption", get(handlers::get_batch_consumption))
        .route("/:batch_id/transactions", get(handlers::get_batch_transactions))
}
