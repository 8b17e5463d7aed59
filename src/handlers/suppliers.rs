use crate::{
    auth::AuthenticatedUser,
    entities::supplier_statement::PaymentStatus,
    errors::{ApiError, ErrorResponse},
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response, validate_input,
    },
    services::suppliers::{
        CreateContactInput, CreateStatementInput, CreateSupplierInput, UpdateContactInput,
        UpdateStatementInput, UpdateSupplierInput,
    },
    AppState,
};
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub address: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub abn_number: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSupplierRequest {
    pub name: Option<String>,
    pub address: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub abn_number: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateContactRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub role: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    pub role: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStatementRequest {
    /// Billing period, "YYYY-MM"
    pub month_year: String,
    pub due_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateStatementRequest {
    pub due_date: Option<Option<NaiveDate>>,
    pub amount: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created"),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .suppliers
        .create_supplier(CreateSupplierInput {
            name: payload.name,
            address: payload.address,
            email: payload.email,
            phone: payload.phone,
            website: payload.website,
            abn_number: payload.abn_number,
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response("Supplier created", created))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    responses((status = 200, description = "Suppliers listed by name")),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = state
        .services
        .suppliers
        .list_suppliers()
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Suppliers retrieved", suppliers))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier found"),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = state
        .services
        .suppliers
        .get_supplier(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Supplier retrieved", supplier))
}

#[utoipa::path(
    patch,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = UpdateSupplierRequest,
    responses(
        (status = 200, description = "Supplier updated"),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .suppliers
        .update_supplier(
            id,
            UpdateSupplierInput {
                name: payload.name,
                address: payload.address,
                email: payload.email,
                phone: payload.phone,
                website: payload.website,
                abn_number: payload.abn_number,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Supplier updated", updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 204, description = "Supplier deleted with contacts and statements"),
        (status = 404, description = "Supplier not found", body = ErrorResponse),
        (status = 409, description = "Supplier still referenced by purchase orders", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .suppliers
        .delete_supplier(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers/{id}/contacts",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Contact created"),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .suppliers
        .create_contact(
            id,
            CreateContactInput {
                name: payload.name,
                role: payload.role,
                email: payload.email,
                phone: payload.phone,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(created_response("Contact created", created))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}/contacts",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses((status = 200, description = "Contacts listed")),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let contacts = state
        .services
        .suppliers
        .list_contacts(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Contacts retrieved", contacts))
}

#[utoipa::path(
    patch,
    path = "/api/v1/suppliers/{id}/contacts/{contact_id}",
    params(
        ("id" = Uuid, Path, description = "Supplier id"),
        ("contact_id" = Uuid, Path, description = "Contact id")
    ),
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Contact updated"),
        (status = 404, description = "Contact not found on this supplier", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn update_contact(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .suppliers
        .update_contact(
            id,
            contact_id,
            UpdateContactInput {
                name: payload.name,
                role: payload.role,
                email: payload.email,
                phone: payload.phone,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Contact updated", updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}/contacts/{contact_id}",
    params(
        ("id" = Uuid, Path, description = "Supplier id"),
        ("contact_id" = Uuid, Path, description = "Contact id")
    ),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 404, description = "Contact not found on this supplier", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .suppliers
        .delete_contact(id, contact_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers/{id}/statements",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = CreateStatementRequest,
    responses(
        (status = 201, description = "Statement created"),
        (status = 400, description = "Invalid billing period", body = ErrorResponse),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn create_statement(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateStatementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .suppliers
        .create_statement(
            id,
            CreateStatementInput {
                month_year: payload.month_year,
                due_date: payload.due_date,
                amount: payload.amount,
                payment_status: payload.payment_status,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(created_response("Statement created", created))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}/statements",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses((status = 200, description = "Statements listed")),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn list_statements(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let statements = state
        .services
        .suppliers
        .list_statements(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Statements retrieved", statements))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}/statements/{statement_id}",
    params(
        ("id" = Uuid, Path, description = "Supplier id"),
        ("statement_id" = Uuid, Path, description = "Statement id")
    ),
    responses(
        (status = 200, description = "Statement found"),
        (status = 404, description = "Statement not found on this supplier", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn get_statement(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, statement_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let statement = state
        .services
        .suppliers
        .get_statement(id, statement_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Statement retrieved", statement))
}

#[utoipa::path(
    patch,
    path = "/api/v1/suppliers/{id}/statements/{statement_id}",
    params(
        ("id" = Uuid, Path, description = "Supplier id"),
        ("statement_id" = Uuid, Path, description = "Statement id")
    ),
    request_body = UpdateStatementRequest,
    responses(
        (status = 200, description = "Statement updated"),
        (status = 404, description = "Statement not found on this supplier", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn update_statement(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, statement_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateStatementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .suppliers
        .update_statement(
            id,
            statement_id,
            UpdateStatementInput {
                due_date: payload.due_date,
                amount: payload.amount,
                payment_status: payload.payment_status,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Statement updated", updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}/statements/{statement_id}",
    params(
        ("id" = Uuid, Path, description = "Supplier id"),
        ("statement_id" = Uuid, Path, description = "Statement id")
    ),
    responses(
        (status = 204, description = "Statement deleted"),
        (status = 404, description = "Statement not found on this supplier", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn delete_statement(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, statement_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .suppliers
        .delete_statement(id, statement_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers/{id}/statements/{statement_id}/file",
    params(
        ("id" = Uuid, Path, description = "Supplier id"),
        ("statement_id" = Uuid, Path, description = "Statement id")
    ),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Statement file stored and attached"),
        (status = 400, description = "Missing or invalid file", body = ErrorResponse),
        (status = 404, description = "Statement not found on this supplier", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn upload_statement_file(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, statement_id)): Path<(Uuid, Uuid)>,
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
        let file_name = field.file_name().unwrap_or("statement").to_string();
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

    let attached = state
        .services
        .suppliers
        .attach_statement_file(id, statement_id, stored.url.clone())
        .await;
    match attached {
        Ok(statement) => Ok(success_response("Statement file attached", statement)),
        Err(err) => {
            state.services.media.remove_by_url(&stored.url).await;
            Err(map_service_error(err))
        }
    }
}

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supplier).get(list_suppliers))
        .route(
            "/:id",
            get(get_supplier).patch(update_supplier).delete(delete_supplier),
        )
        .route("/:id/contacts", post(create_contact).get(list_contacts))
        .route(
            "/:id/contacts/:contact_id",
            axum::routing::patch(update_contact).delete(delete_contact),
        )
        .route(
            "/:id/statements",
            post(create_statement).get(list_statements),
        )
        .route(
            "/:id/statements/:statement_id",
            get(get_statement)
                .patch(update_statement)
                .delete(delete_statement),
        )
        .route(
            "/:id/statements/:statement_id/file",
            post(upload_statement_file),
        )
}
