use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::customers::{CreateCustomerRequest, UpdateCustomerRequest},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct CustomerListQuery {
    is_active: Option<bool>,
}

async fn create_customer(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let customer = state
        .services
        .customers
        .create_customer(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(customer))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .get_customer(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

async fn get_customer_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .get_customer_by_email(&email)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (customers, total) = state
        .services
        .customers
        .list_customers(query.is_active, params.page, params.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        customers,
        params.page,
        params.per_page,
        total,
    )))
}

async fn update_customer(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .update_customer(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route("/by-email/:email", get(get_customer_by_email))
        .route("/:id", get(get_customer).put(update_customer))
}
