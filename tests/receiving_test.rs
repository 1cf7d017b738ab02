mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use ledgerline_api::entities::purchase_order::PurchaseOrderStatus;
use ledgerline_api::entities::purchase_receipt::ReceiptStatus;
use ledgerline_api::errors::ServiceError;
use ledgerline_api::services::orders::OrderItemInput;
use ledgerline_api::services::purchasing::{
    CreatePurchaseOrderRequest, PurchaseOrderWithItems, UpdatePurchaseOrderRequest,
};
use ledgerline_api::services::receiving::{CreateReceiptRequest, ReceiptItemInput};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Purchase order for 10 units at 20 each (total 200), optionally confirmed.
async fn seed_purchase_order(
    ctx: &common::TestContext,
    order_number: &str,
    confirm: bool,
) -> PurchaseOrderWithItems {
    let supplier_id = ctx
        .seed_supplier(&format!("{order_number}@example.com"))
        .await;
    let product = ctx
        .seed_product(&format!("RCV-{order_number}"), dec!(20))
        .await;
    let order = ctx
        .purchasing
        .create_purchase_order(
            CreatePurchaseOrderRequest {
                supplier_id,
                order_number: order_number.to_string(),
                expected_date: Utc::now() + Duration::days(14),
                items: vec![OrderItemInput {
                    product_id: product.id,
                    quantity: 10,
                    unit_price: Some(dec!(20)),
                    discount: dec!(0),
                    notes: None,
                }],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .expect("seed purchase order");

    if confirm {
        ctx.purchasing
            .update_purchase_order(
                order.order.id,
                UpdatePurchaseOrderRequest {
                    status: Some(PurchaseOrderStatus::Confirmed),
                    ..Default::default()
                },
            )
            .await
            .expect("confirm purchase order");
    }
    order
}

fn receipt(number: &str, order_item_id: Uuid, quantity: i32) -> CreateReceiptRequest {
    CreateReceiptRequest {
        receipt_number: number.to_string(),
        items: vec![ReceiptItemInput {
            order_item_id,
            quantity,
            unit_price: None,
            notes: None,
        }],
        notes: None,
    }
}

#[tokio::test]
async fn full_receipt_moves_order_to_received() {
    let ctx = common::setup().await;
    let order = seed_purchase_order(&ctx, "PO-3001", true).await;
    assert_eq!(order.order.total_amount, dec!(200));

    let created = ctx
        .receiving
        .create_receipt(
            order.order.id,
            receipt("RC-3001", order.items[0].id, 10),
            ctx.actor,
        )
        .await
        .expect("create receipt");

    assert_eq!(created.receipt.status, ReceiptStatus::Received);
    assert_eq!(created.receipt.total_amount, dec!(200));

    let reloaded = ctx
        .purchasing
        .get_purchase_order(order.order.id)
        .await
        .unwrap();
    assert_eq!(reloaded.order.status, PurchaseOrderStatus::Received);
}

#[tokio::test]
async fn partial_receipts_accumulate_until_order_total_is_covered() {
    let ctx = common::setup().await;
    let order = seed_purchase_order(&ctx, "PO-3002", true).await;
    let line = order.items[0].id;

    ctx.receiving
        .create_receipt(order.order.id, receipt("RC-3002A", line, 4), ctx.actor)
        .await
        .unwrap();
    let after_partial = ctx
        .purchasing
        .get_purchase_order(order.order.id)
        .await
        .unwrap();
    assert_eq!(after_partial.order.status, PurchaseOrderStatus::Confirmed);

    ctx.receiving
        .create_receipt(order.order.id, receipt("RC-3002B", line, 6), ctx.actor)
        .await
        .unwrap();
    let after_full = ctx
        .purchasing
        .get_purchase_order(order.order.id)
        .await
        .unwrap();
    assert_eq!(after_full.order.status, PurchaseOrderStatus::Received);
}

#[tokio::test]
async fn receiving_against_unconfirmed_order_is_rejected() {
    let ctx = common::setup().await;
    let order = seed_purchase_order(&ctx, "PO-3003", false).await;

    let err = ctx
        .receiving
        .create_receipt(
            order.order.id,
            receipt("RC-3003", order.items[0].id, 1),
            ctx.actor,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn over_receipt_on_a_line_is_rejected() {
    let ctx = common::setup().await;
    let order = seed_purchase_order(&ctx, "PO-3004", true).await;
    let line = order.items[0].id;

    ctx.receiving
        .create_receipt(order.order.id, receipt("RC-3004A", line, 8), ctx.actor)
        .await
        .unwrap();

    // 8 already received; 3 more would exceed the ordered 10.
    let err = ctx
        .receiving
        .create_receipt(order.order.id, receipt("RC-3004B", line, 3), ctx.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    // The failed receipt left nothing behind.
    let (receipts, total) = ctx
        .receiving
        .list_receipts(Some(order.order.id), 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(receipts[0].receipt_number, "RC-3004A");
}

#[tokio::test]
async fn receipt_line_must_belong_to_the_order() {
    let ctx = common::setup().await;
    let order = seed_purchase_order(&ctx, "PO-3005", true).await;
    let other = seed_purchase_order(&ctx, "PO-3006", true).await;

    let err = ctx
        .receiving
        .create_receipt(
            order.order.id,
            receipt("RC-3005", other.items[0].id, 1),
            ctx.actor,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn receipt_total_ignores_order_discounts() {
    let ctx = common::setup().await;
    let supplier_id = ctx.seed_supplier("po-3007@example.com").await;
    let product = ctx.seed_product("RCV-PO-3007", dec!(20)).await;

    // Order with a 50% discount: order total 100, receipt priced at full 20.
    let order = ctx
        .purchasing
        .create_purchase_order(
            CreatePurchaseOrderRequest {
                supplier_id,
                order_number: "PO-3007".to_string(),
                expected_date: Utc::now() + Duration::days(14),
                items: vec![OrderItemInput {
                    product_id: product.id,
                    quantity: 10,
                    unit_price: Some(dec!(20)),
                    discount: dec!(0.5),
                    notes: None,
                }],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .unwrap();
    assert_eq!(order.order.total_amount, dec!(100));

    ctx.purchasing
        .update_purchase_order(
            order.order.id,
            UpdatePurchaseOrderRequest {
                status: Some(PurchaseOrderStatus::Confirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let created = ctx
        .receiving
        .create_receipt(
            order.order.id,
            receipt("RC-3007", order.items[0].id, 5),
            ctx.actor,
        )
        .await
        .unwrap();
    assert_eq!(created.receipt.total_amount, dec!(100));

    // 5 × 20 = 100 already covers the discounted order total.
    let reloaded = ctx
        .purchasing
        .get_purchase_order(order.order.id)
        .await
        .unwrap();
    assert_eq!(reloaded.order.status, PurchaseOrderStatus::Received);
}
