//! Millwork Admin API Library
//!
//! Core functionality for the millwork back-office API: inventory items,
//! suppliers, materials-to-order aggregates, purchase orders and the stock
//! ledger, reconciled by the purchase order command layer.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub auth: Arc<auth::AuthService>,
    pub services: handlers::AppServices,
}

/// Envelope wrapping every JSON response.
///
/// `status` is the success flag clients branch on; `message` is always
/// present for toast display.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: true,
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            status: false,
            message,
            data: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Builds the authenticated `/api/v1` surface plus the open status and
/// health endpoints.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/items", handlers::items::item_routes())
        .nest(
            "/stock-transactions",
            handlers::stock_transactions::stock_transaction_routes(),
        )
        .nest(
            "/materials-to-order",
            handlers::materials_to_order::materials_to_order_routes(),
        )
        .nest(
            "/purchase-orders",
            handlers::purchase_orders::purchase_order_routes(),
        )
        .nest("/suppliers", handlers::suppliers::supplier_routes())
        .nest("/config", handlers::config_values::config_value_routes())
}

async fn api_status() -> ApiResult<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "millwork-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success("ok", status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success("health", health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_envelope_carries_data_and_message() {
        let response = ApiResponse::success("done", 7);
        assert!(response.status);
        assert_eq!(response.message, "done");
        assert_eq!(response.data, Some(7));
    }

    #[test]
    fn error_envelope_has_no_data() {
        let response = ApiResponse::<()>::error("broken".into());
        assert!(!response.status);
        assert!(response.data.is_none());
    }
}
