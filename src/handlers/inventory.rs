use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::inventory::{CreateStockRequest, RecordMovementRequest},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

async fn create_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let stock = state
        .services
        .inventory
        .create_stock(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(stock))
}

async fn get_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let stock = state
        .services
        .inventory
        .get_stock_by_product(product_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(stock))
}

async fn list_stock(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (rows, total) = state
        .services
        .inventory
        .list_stock(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        rows,
        params.page,
        params.per_page,
        total,
    )))
}

async fn record_movement(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<RecordMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let movement = state
        .services
        .inventory
        .record_movement(payload, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(movement))
}

async fn list_movements(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (movements, total) = state
        .services
        .inventory
        .list_movements(product_id, params.page, params.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        movements,
        params.page,
        params.per_page,
        total,
    )))
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/stock", post(create_stock).get(list_stock))
        .route("/stock/:product_id", get(get_stock))
        .route("/stock-movements", post(record_movement))
        .route("/stock-movements/:product_id", get(list_movements))
}
