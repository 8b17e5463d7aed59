use crate::{
    auth::AuthenticatedUser,
    errors::{ApiError, ErrorResponse},
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response, validate_input,
    },
    services::materials_to_order::{CreateMaterialsToOrderInput, MaterialsToOrderLineInput},
    AppState,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct MaterialsToOrderLineDto {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMaterialsToOrderRequest {
    pub project_id: Uuid,
    /// Lot UUIDs covered by this aggregate; empty means the whole project
    #[serde(default)]
    pub lot_ids: Vec<Uuid>,
    #[validate(length(min = 1, message = "At least one material line is required"))]
    pub items: Vec<MaterialsToOrderLineDto>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Only the free-text notes are client-editable; status and counters are
/// owned by the reconciliation engine.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMaterialsToOrderRequest {
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMaterialsToOrderQuery {
    pub project_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/v1/materials-to-order",
    request_body = CreateMaterialsToOrderRequest,
    responses(
        (status = 201, description = "Aggregate created in DRAFT"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "A referenced item does not exist", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials-to-order"
)]
pub async fn create_materials_to_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateMaterialsToOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .materials_to_order
        .create(CreateMaterialsToOrderInput {
            project_id: payload.project_id,
            lot_ids: payload.lot_ids,
            items: payload
                .items
                .into_iter()
                .map(|line| MaterialsToOrderLineInput {
                    item_id: line.item_id,
                    quantity: line.quantity,
                })
                .collect(),
            notes: payload.notes,
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response("Materials to order created", created))
}

#[utoipa::path(
    get,
    path = "/api/v1/materials-to-order",
    params(ListMaterialsToOrderQuery),
    responses((status = 200, description = "Aggregates listed, newest first")),
    security(("bearer_auth" = [])),
    tag = "materials-to-order"
)]
pub async fn list_materials_to_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListMaterialsToOrderQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let aggregates = state
        .services
        .materials_to_order
        .list(query.project_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Materials to order retrieved", aggregates))
}

#[utoipa::path(
    get,
    path = "/api/v1/materials-to-order/{id}",
    params(("id" = Uuid, Path, description = "Materials to order id")),
    responses(
        (status = 200, description = "Aggregate with lines and media"),
        (status = 404, description = "Aggregate not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials-to-order"
)]
pub async fn get_materials_to_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .materials_to_order
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Materials to order retrieved", detail))
}

#[utoipa::path(
    patch,
    path = "/api/v1/materials-to-order/{id}",
    params(("id" = Uuid, Path, description = "Materials to order id")),
    request_body = UpdateMaterialsToOrderRequest,
    responses(
        (status = 200, description = "Notes updated"),
        (status = 404, description = "Aggregate not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials-to-order"
)]
pub async fn update_materials_to_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaterialsToOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .materials_to_order
        .update_notes(id, payload.notes)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Materials to order updated", updated))
}

#[utoipa::path(
    post,
    path = "/api/v1/materials-to-order/{id}/close",
    params(("id" = Uuid, Path, description = "Materials to order id")),
    responses(
        (status = 200, description = "Aggregate closed; no further ordering against it"),
        (status = 400, description = "Aggregate is already closed", body = ErrorResponse),
        (status = 404, description = "Aggregate not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials-to-order"
)]
pub async fn close_materials_to_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let closed = state
        .services
        .materials_to_order
        .close(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Materials to order closed", closed))
}

#[utoipa::path(
    post,
    path = "/api/v1/materials-to-order/{id}/media",
    params(("id" = Uuid, Path, description = "Materials to order id")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Media stored and attached"),
        (status = 400, description = "Missing or invalid file", body = ErrorResponse),
        (status = 404, description = "Aggregate not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials-to-order"
)]
pub async fn upload_materials_to_order_media(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut media = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let stored = state
            .services
            .media
            .store(&file_name, &bytes)
            .await
            .map_err(map_service_error)?;
        let attached = state
            .services
            .materials_to_order
            .add_media(id, file_name, stored.url.clone(), content_type)
            .await;
        match attached {
            Ok(row) => media.push(row),
            Err(err) => {
                state.services.media.remove_by_url(&stored.url).await;
                return Err(map_service_error(err));
            }
        }
    }
    if media.is_empty() {
        return Err(ApiError::BadRequest(
            "Multipart field 'file' is required".into(),
        ));
    }
    Ok(created_response("Media uploaded", media))
}

#[utoipa::path(
    delete,
    path = "/api/v1/materials-to-order/{id}/media/{media_id}",
    params(
        ("id" = Uuid, Path, description = "Materials to order id"),
        ("media_id" = Uuid, Path, description = "Media id")
    ),
    responses(
        (status = 204, description = "Media removed"),
        (status = 404, description = "Media not found on this aggregate", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials-to-order"
)]
pub async fn remove_materials_to_order_media(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, media_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state
        .services
        .materials_to_order
        .remove_media(id, media_id)
        .await
        .map_err(map_service_error)?;
    state.services.media.remove_by_url(&removed.url).await;
    Ok(no_content_response())
}

pub fn materials_to_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_materials_to_order).get(list_materials_to_order),
        )
        .route(
            "/:id",
            get(get_materials_to_order).patch(update_materials_to_order),
        )
        .route("/:id/close", post(close_materials_to_order))
        .route("/:id/media", post(upload_materials_to_order_media))
        .route(
            "/:id/media/:media_id",
            delete(remove_materials_to_order_media),
        )
}
