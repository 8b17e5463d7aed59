use crate::{
    auth::AuthenticatedUser,
    errors::{ApiError, ErrorResponse},
    handlers::common::{created_response, map_service_error, validate_input},
    services::stock_ledger::RecordStockTransactionInput,
    AppState,
};
use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};

#[utoipa::path(
    post,
    path = "/api/v1/stock-transactions",
    request_body = RecordStockTransactionInput,
    responses(
        (status = 201, description = "Transaction recorded"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 422, description = "Insufficient stock on hand", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn record_stock_transaction(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<RecordStockTransactionInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let recorded = state
        .services
        .stock_ledger
        .record(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response("Stock transaction recorded", recorded))
}

pub fn stock_transaction_routes() -> Router<AppState> {
    Router::new().route("/", post(record_stock_transaction))
}
