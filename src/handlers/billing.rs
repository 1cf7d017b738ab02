use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    entities::invoice::PaymentStatus,
    errors::ApiError,
    services::billing::{CreateInvoiceRequest, RecordPaymentRequest, UpdateInvoiceRequest},
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
struct InvoiceListQuery {
    order_id: Option<Uuid>,
    payment_status: Option<PaymentStatus>,
}

async fn create_invoice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let invoice = state
        .services
        .billing
        .create_invoice(payload, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(invoice))
}

async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state
        .services
        .billing
        .get_invoice(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(invoice))
}

async fn get_invoice_by_number(
    State(state): State<AppState>,
    Path(invoice_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state
        .services
        .billing
        .get_invoice_by_number(&invoice_number)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(invoice))
}

async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (invoices, total) = state
        .services
        .billing
        .list_invoices(
            query.order_id,
            query.payment_status,
            params.page,
            params.per_page,
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        invoices,
        params.page,
        params.per_page,
        total,
    )))
}

async fn update_invoice(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state
        .services
        .billing
        .update_invoice(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(invoice))
}

async fn record_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let payment = state
        .services
        .billing
        .record_payment(invoice_id, payload, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(payment))
}

async fn list_payments(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (payments, total) = state
        .services
        .billing
        .list_payments(invoice_id, params.page, params.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        payments,
        params.page,
        params.per_page,
        total,
    )))
}

pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(create_invoice).get(list_invoices))
        .route("/invoices/by-number/:invoice_number", get(get_invoice_by_number))
        .route("/invoices/:id", get(get_invoice).put(update_invoice))
        .route(
            "/invoices/:id/payments",
            post(record_payment).get(list_payments),
        )
}
