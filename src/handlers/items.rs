use crate::{
    auth::AuthenticatedUser,
    entities::item::ItemCategory,
    errors::{ApiError, ErrorResponse},
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input, PaginatedResponse, PaginationParams,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::services::items::{CreateItemInput, ItemAttributes, UpdateItemInput};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,
    pub price: Decimal,
    #[validate(length(min = 1, message = "Measurement unit must not be empty"))]
    pub measurement_unit: String,
    pub supplier_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub attributes: ItemAttributes,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub measurement_unit: Option<String>,
    pub supplier_id: Option<Option<Uuid>>,
    pub image_url: Option<Option<String>>,
    /// Must match the item's stored category when present
    pub attributes: Option<ItemAttributes>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListItemsQuery {
    pub category: Option<ItemCategory>,
}

#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created"),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .items
        .create_item(CreateItemInput {
            description: payload.description,
            price: payload.price,
            measurement_unit: payload.measurement_unit,
            supplier_id: payload.supplier_id,
            image_url: payload.image_url,
            attributes: payload.attributes,
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response("Item created", created))
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ListItemsQuery),
    responses((status = 200, description = "Items listed")),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListItemsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .items
        .list_items(query.category)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Items retrieved", items))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item found"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .items
        .get_item(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Item retrieved", item))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/by-supplier/{supplier_id}",
    params(("supplier_id" = Uuid, Path, description = "Supplier id")),
    responses((status = 200, description = "Supplier's items listed")),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn list_items_by_supplier(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .items
        .list_items_by_supplier(supplier_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Items retrieved", items))
}

#[utoipa::path(
    patch,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .items
        .update_item(
            id,
            UpdateItemInput {
                description: payload.description,
                price: payload.price,
                measurement_unit: payload.measurement_unit,
                supplier_id: payload.supplier_id,
                image_url: payload.image_url,
                attributes: payload.attributes,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Item updated", updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Item still referenced", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .items
        .delete_item(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/stock-transactions",
    params(("id" = Uuid, Path, description = "Item id"), PaginationParams),
    responses((status = 200, description = "Ledger page, most recent first")),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn list_item_stock_transactions(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (rows, total) = state
        .services
        .stock_ledger
        .list_for_item(id, pagination.page_index(), pagination.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(
        "Stock transactions retrieved",
        PaginatedResponse::new(rows, pagination.page, pagination.per_page, total),
    ))
}

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item).get(list_items))
        .route(
            "/:id",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/by-supplier/:supplier_id", get(list_items_by_supplier))
        .route("/:id/stock-transactions", get(list_item_stock_transactions))
}
