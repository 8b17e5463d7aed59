use crate::{
    auth::AuthenticatedUser,
    entities::config_value::ConfigCategory,
    errors::{ApiError, ErrorResponse},
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    AppState,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListConfigValuesQuery {
    pub category: ConfigCategory,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateConfigValueRequest {
    pub category: ConfigCategory,
    #[validate(length(min = 1, message = "Value must not be empty"))]
    pub value: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/config/values",
    params(ListConfigValuesQuery),
    responses((status = 200, description = "Vocabulary values for the category")),
    security(("bearer_auth" = [])),
    tag = "config"
)]
pub async fn list_config_values(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListConfigValuesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let values = state
        .services
        .config_values
        .list_by_category(query.category)
        .await
        .map_err(map_service_error)?;
    Ok(success_response("Config values retrieved", values))
}

#[utoipa::path(
    post,
    path = "/api/v1/config/values",
    request_body = CreateConfigValueRequest,
    responses(
        (status = 201, description = "Value added to the vocabulary"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Value already exists in this category", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "config"
)]
pub async fn create_config_value(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateConfigValueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .config_values
        .create(payload.category, payload.value)
        .await
        .map_err(map_service_error)?;
    Ok(created_response("Config value created", created))
}

pub fn config_value_routes() -> Router<AppState> {
    Router::new().route("/values", get(list_config_values).post(create_config_value))
}
