use crate::{
    auth::AuthenticatedUser,
    commands::purchase_orders::{
        update_purchase_order_command::Patch, CreatePurchaseOrderCommand, PurchaseOrderLineRequest,
        ReceiptLine, ReceivePurchaseOrderCommand, UpdatePurchaseOrderCommand,
    },
    entities::purchase_order::PurchaseOrderStatus,
    errors::{ApiError, ErrorResponse},
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response, validate_input,
    },
    AppState,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderLineDto {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    #[validate(length(min = 1, message = "Order number must not be empty"))]
    pub order_no: String,
    pub supplier_id: Uuid,
    pub materials_to_order_id: Uuid,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<PurchaseOrderLineDto>,
    pub delivery_charge: Option<Decimal>,
    pub invoice_url: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderRequest {
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub delivery_charge: Option<Decimal>,
    #[serde(default)]
    pub invoice_url: Patch<String>,
    #[serde(default)]
    pub invoice_date: Patch<NaiveDate>,
    /// Only the `DRAFT → ORDERED` transition is accepted here; cancellation
    /// has its own endpoint because it rolls back MTO allocations
    pub status: Option<PurchaseOrderStatus>,
    pub ordered_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiptLineDto {
    pub purchase_order_item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReceivePurchaseOrderRequest {
    #[validate(length(min = 1, message = "At least one receipt line is required"))]
    pub receipts: Vec<ReceiptLineDto>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPurchaseOrdersQuery {
    pub supplier_id: Option<Uuid>,
    pub materials_to_order_id: Option<Uuid>,
}

/// Purchase order with its lines, as returned by get/create
#[derive(Debug, Serialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub purchase_order: crate::entities::purchase_order::Model,
    pub items: Vec<crate::entities::purchase_order_item::Model>,
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order created against the MTO"),
        (status = 400, description = "Invalid input or item not on the MTO", body = ErrorResponse),
        (status = 404, description = "Supplier or MTO not found", body = ErrorResponse),
        (status = 409, description = "Duplicate order number or over-allocation", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let command = CreatePurchaseOrderCommand {
        order_no: payload.order_no,
        supplier_id: payload.supplier_id,
        materials_to_order_id: payload.materials_to_order_id,
        items: payload
            .items
            .into_iter()
            .map(|line| PurchaseOrderLineRequest {
                item_id: line.item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect(),
        delivery_charge: payload.delivery_charge,
        invoice_url: payload.invoice_url,
        invoice_date: payload.invoice_date,
        notes: payload.notes,
    };
    let result = state
        .services
        .reconciliation
        .create_purchase_order(command)
        .await
        .map_err(map_service_error)?;
    Ok(created_response("Purchase order created", result))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(ListPurchaseOrdersQuery),
    responses((status = 200, description = "Purchase orders listed, newest first")),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListPurchaseOrdersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .reconciliation
        .list_purchase_orders(query.supplier_id, query.materials_to_order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Purchase orders retrieved", orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order found"),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (purchase_order, items) = state
        .services
        .reconciliation
        .get_purchase_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(
        "Purchase order retrieved",
        PurchaseOrderDetail {
            purchase_order,
            items,
        },
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/by-supplier/{supplier_id}",
    params(("supplier_id" = Uuid, Path, description = "Supplier id")),
    responses((status = 200, description = "Supplier's purchase orders listed")),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders_by_supplier(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .reconciliation
        .list_purchase_orders(Some(supplier_id), None)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Purchase orders retrieved", orders))
}

#[utoipa::path(
    patch,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = UpdatePurchaseOrderRequest,
    responses(
        (status = 200, description = "Purchase order updated"),
        (status = 400, description = "Invalid input or status transition", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    // The authenticated user is recorded as the one placing the order unless
    // the payload names someone else.
    let ordered_by = payload.ordered_by.or_else(|| Some(user.display_name()));
    let command = UpdatePurchaseOrderCommand {
        purchase_order_id: id,
        notes: payload.notes,
        delivery_charge: payload.delivery_charge,
        invoice_url: payload.invoice_url,
        invoice_date: payload.invoice_date,
        status: payload.status,
        ordered_by,
    };
    let updated = state
        .services
        .reconciliation
        .update_purchase_order(command)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Purchase order updated", updated))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order cancelled, unreceived allocations rolled back"),
        (status = 400, description = "Order cannot be cancelled from its current status", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cancelled = state
        .services
        .reconciliation
        .cancel_purchase_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Purchase order cancelled", cancelled))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/receive",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = ReceivePurchaseOrderRequest,
    responses(
        (status = 200, description = "Receipt recorded; stock and ledger updated"),
        (status = 400, description = "Invalid input or order not receivable", body = ErrorResponse),
        (status = 404, description = "Purchase order or line not found", body = ErrorResponse),
        (status = 409, description = "Receipt exceeds ordered quantity", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceivePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let command = ReceivePurchaseOrderCommand {
        purchase_order_id: id,
        receipts: payload
            .receipts
            .into_iter()
            .map(|line| ReceiptLine {
                purchase_order_item_id: line.purchase_order_item_id,
                quantity: line.quantity,
            })
            .collect(),
    };
    let result = state
        .services
        .reconciliation
        .receive_purchase_order(command)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Purchase order receipt recorded", result))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/invoice",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Invoice stored and attached"),
        (status = 400, description = "Missing or invalid file", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn upload_purchase_order_invoice(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut stored = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("invoice").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        stored = Some(
            state
                .services
                .media
                .store(&file_name, &bytes)
                .await
                .map_err(map_service_error)?,
        );
        break;
    }
    let stored =
        stored.ok_or_else(|| ApiError::BadRequest("Multipart field 'file' is required".into()))?;

    let command = UpdatePurchaseOrderCommand {
        purchase_order_id: id,
        notes: None,
        delivery_charge: None,
        invoice_url: Patch::Set(Some(stored.url.clone())),
        invoice_date: Patch::Keep,
        status: None,
        ordered_by: None,
    };
    let updated = state
        .services
        .reconciliation
        .update_purchase_order(command)
        .await;

    match updated {
        Ok(updated) => Ok(success_response("Invoice attached", updated)),
        Err(err) => {
            // The order rejected the attachment; the orphaned file goes too.
            state.services.media.remove_by_url(&stored.url).await;
            Err(map_service_error(err))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 204, description = "Purchase order deleted, allocations rolled back"),
        (status = 404, description = "Purchase order not found", body = ErrorResponse),
        (status = 409, description = "Order has received stock", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .reconciliation
        .delete_purchase_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_purchase_order).get(list_purchase_orders))
        .route(
            "/:id",
            get(get_purchase_order)
                .patch(update_purchase_order)
                .delete(delete_purchase_order),
        )
        .route(
            "/by-supplier/:supplier_id",
            get(list_purchase_orders_by_supplier),
        )
        .route("/:id/cancel", post(cancel_purchase_order))
        .route("/:id/receive", post(receive_purchase_order))
        .route("/:id/invoice", post(upload_purchase_order_invoice))
}
