mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use ledgerline_api::entities::invoice::PaymentStatus;
use ledgerline_api::entities::sales_order::SalesOrderStatus;
use ledgerline_api::errors::ServiceError;
use ledgerline_api::services::billing::{CreateInvoiceRequest, RecordPaymentRequest};
use ledgerline_api::services::orders::{CreateSalesOrderRequest, OrderItemInput, UpdateSalesOrderRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seed_order(ctx: &common::TestContext, order_number: &str, confirm: bool) -> Uuid {
    let customer_id = ctx
        .seed_customer(&format!("{order_number}@example.com"))
        .await;
    let product = ctx.seed_product(&format!("BIL-{order_number}"), dec!(50)).await;
    let order = ctx
        .orders
        .create_order(
            CreateSalesOrderRequest {
                customer_id,
                order_number: order_number.to_string(),
                items: vec![OrderItemInput {
                    product_id: product.id,
                    quantity: 2,
                    unit_price: Some(dec!(50)),
                    discount: dec!(0),
                    notes: None,
                }],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .expect("seed order");

    if confirm {
        ctx.orders
            .update_order(
                order.order.id,
                UpdateSalesOrderRequest {
                    status: Some(SalesOrderStatus::Confirmed),
                    ..Default::default()
                },
            )
            .await
            .expect("confirm order");
    }
    order.order.id
}

fn invoice_request(order_id: Uuid, number: &str, total: Decimal) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        order_id,
        invoice_number: number.to_string(),
        due_date: Utc::now() + Duration::days(30),
        total_amount: total,
        tax_amount: dec!(0),
        notes: None,
    }
}

fn payment(amount: Decimal) -> RecordPaymentRequest {
    RecordPaymentRequest {
        amount,
        payment_method: "bank_transfer".to_string(),
        reference: None,
        notes: None,
    }
}

#[tokio::test]
async fn invoice_requires_confirmed_order() {
    let ctx = common::setup().await;
    let order_id = seed_order(&ctx, "SO-2001", false).await;

    let err = ctx
        .billing
        .create_invoice(invoice_request(order_id, "INV-2001", dec!(100)), ctx.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    // Nothing was persisted.
    assert_matches!(
        ctx.billing.get_invoice_by_number("INV-2001").await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn invoice_on_unknown_order_is_not_found() {
    let ctx = common::setup().await;

    let err = ctx
        .billing
        .create_invoice(
            invoice_request(Uuid::new_v4(), "INV-2002", dec!(100)),
            ctx.actor,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn payments_drive_status_pending_partial_paid() {
    let ctx = common::setup().await;
    let order_id = seed_order(&ctx, "SO-2003", true).await;

    let invoice = ctx
        .billing
        .create_invoice(invoice_request(order_id, "INV-2003", dec!(100)), ctx.actor)
        .await
        .unwrap();
    assert_eq!(invoice.payment_status, PaymentStatus::Pending);

    ctx.billing
        .record_payment(invoice.id, payment(dec!(40)), ctx.actor)
        .await
        .unwrap();
    let after_first = ctx.billing.get_invoice(invoice.id).await.unwrap();
    assert_eq!(after_first.payment_status, PaymentStatus::Partial);

    ctx.billing
        .record_payment(invoice.id, payment(dec!(60)), ctx.actor)
        .await
        .unwrap();
    let after_second = ctx.billing.get_invoice(invoice.id).await.unwrap();
    assert_eq!(after_second.payment_status, PaymentStatus::Paid);

    let (payments, total) = ctx.billing.list_payments(invoice.id, 1, 20).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(payments.iter().map(|p| p.amount).sum::<Decimal>(), dec!(100));
}

#[tokio::test]
async fn overpayment_is_rejected_and_changes_nothing() {
    let ctx = common::setup().await;
    let order_id = seed_order(&ctx, "SO-2004", true).await;

    let invoice = ctx
        .billing
        .create_invoice(invoice_request(order_id, "INV-2004", dec!(100)), ctx.actor)
        .await
        .unwrap();

    ctx.billing
        .record_payment(invoice.id, payment(dec!(70)), ctx.actor)
        .await
        .unwrap();

    // Outstanding balance is 30; 31 must be rejected.
    let err = ctx
        .billing
        .record_payment(invoice.id, payment(dec!(31)), ctx.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    let reloaded = ctx.billing.get_invoice(invoice.id).await.unwrap();
    assert_eq!(reloaded.payment_status, PaymentStatus::Partial);
    let (_, total) = ctx.billing.list_payments(invoice.id, 1, 20).await.unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn non_positive_payment_is_rejected() {
    let ctx = common::setup().await;
    let order_id = seed_order(&ctx, "SO-2005", true).await;

    let invoice = ctx
        .billing
        .create_invoice(invoice_request(order_id, "INV-2005", dec!(100)), ctx.actor)
        .await
        .unwrap();

    let err = ctx
        .billing
        .record_payment(invoice.id, payment(dec!(0)), ctx.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn duplicate_invoice_number_is_a_conflict() {
    let ctx = common::setup().await;
    let order_id = seed_order(&ctx, "SO-2006", true).await;

    ctx.billing
        .create_invoice(invoice_request(order_id, "INV-2006", dec!(50)), ctx.actor)
        .await
        .unwrap();
    let err = ctx
        .billing
        .create_invoice(invoice_request(order_id, "INV-2006", dec!(50)), ctx.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}
