use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    entities::purchase_order::PurchaseOrderStatus,
    errors::ApiError,
    services::purchasing::{CreatePurchaseOrderRequest, UpdatePurchaseOrderRequest},
    services::receiving::CreateReceiptRequest,
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
struct PurchaseOrderListQuery {
    supplier_id: Option<Uuid>,
    status: Option<PurchaseOrderStatus>,
}

async fn create_purchase_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let order = state
        .services
        .purchasing
        .create_purchase_order(payload, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(order))
}

async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchasing
        .get_purchase_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

async fn get_purchase_order_by_number(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchasing
        .get_purchase_order_by_number(&order_number)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

async fn get_purchase_order_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // Surfaces not-found for unknown orders rather than an empty list
    state
        .services
        .purchasing
        .get_purchase_order(id)
        .await
        .map_err(map_service_error)
        .map(|order| success_response(order.items))
}

async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<PurchaseOrderListQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (orders, total) = state
        .services
        .purchasing
        .list_purchase_orders(
            query.supplier_id,
            query.status,
            params.page,
            params.per_page,
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        orders,
        params.page,
        params.per_page,
        total,
    )))
}

async fn update_purchase_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchasing
        .update_purchase_order(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

async fn create_receipt(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<CreateReceiptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let receipt = state
        .services
        .receiving
        .create_receipt(order_id, payload, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(receipt))
}

async fn list_order_receipts(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (receipts, total) = state
        .services
        .receiving
        .list_receipts(Some(order_id), params.page, params.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        receipts,
        params.page,
        params.per_page,
        total,
    )))
}

async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .services
        .receiving
        .get_receipt(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(receipt))
}

async fn get_receipt_by_number(
    State(state): State<AppState>,
    Path(receipt_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .services
        .receiving
        .get_receipt_by_number(&receipt_number)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(receipt))
}

pub fn purchasing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchase-orders",
            post(create_purchase_order).get(list_purchase_orders),
        )
        .route(
            "/purchase-orders/by-number/:order_number",
            get(get_purchase_order_by_number),
        )
        .route(
            "/purchase-orders/:id",
            get(get_purchase_order).put(update_purchase_order),
        )
        .route("/purchase-orders/:id/items", get(get_purchase_order_items))
        .route(
            "/purchase-orders/:id/receipts",
            post(create_receipt).get(list_order_receipts),
        )
        .route("/receipts/:id", get(get_receipt))
        .route("/receipts/by-number/:receipt_number", get(get_receipt_by_number))
}
