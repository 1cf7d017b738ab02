//! Ledgerline API Library
//!
//! Record-keeping backend for a single organization's inventory, sales, and
//! purchasing operations.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared application state threaded through every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<axum::Json<T>, errors::ServiceError>;

/// Full v1 API surface: inventory, sales, and purchasing routers plus health.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/categories", handlers::products::category_routes())
        .nest("/products", handlers::products::product_routes())
        .merge(handlers::inventory::stock_routes())
        .nest("/customers", handlers::customers::customer_routes())
        .nest("/orders", handlers::orders::order_routes())
        .merge(handlers::billing::billing_routes())
        .nest("/suppliers", handlers::suppliers::supplier_routes())
        .merge(handlers::purchasing::purchasing_routes())
}
