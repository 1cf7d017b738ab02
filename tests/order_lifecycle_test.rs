mod common;

use assert_matches::assert_matches;
use ledgerline_api::entities::sales_order::SalesOrderStatus;
use ledgerline_api::errors::ServiceError;
use ledgerline_api::services::orders::{
    CreateSalesOrderRequest, OrderItemInput, UpdateSalesOrderRequest,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn item(product_id: Uuid, quantity: i32, unit_price: Decimal, discount: Decimal) -> OrderItemInput {
    OrderItemInput {
        product_id,
        quantity,
        unit_price: Some(unit_price),
        discount,
        notes: None,
    }
}

#[tokio::test]
async fn order_total_is_sum_of_discounted_line_totals() {
    let ctx = common::setup().await;
    let customer_id = ctx.seed_customer("orders1@example.com").await;
    let p1 = ctx.seed_product("ORD-P1", dec!(10)).await;
    let p2 = ctx.seed_product("ORD-P2", dec!(5)).await;

    let order = ctx
        .orders
        .create_order(
            CreateSalesOrderRequest {
                customer_id,
                order_number: "SO-1001".to_string(),
                items: vec![
                    item(p1.id, 2, dec!(10), dec!(0)),
                    item(p2.id, 1, dec!(5), dec!(0.1)),
                ],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .expect("create order");

    assert_eq!(order.order.total_amount, dec!(24.5));
    assert_eq!(order.order.status, SalesOrderStatus::Draft);
    assert_eq!(order.items.len(), 2);
}

#[tokio::test]
async fn missing_unit_price_defaults_to_product_price() {
    let ctx = common::setup().await;
    let customer_id = ctx.seed_customer("orders2@example.com").await;
    let product = ctx.seed_product("ORD-P3", dec!(7.25)).await;

    let order = ctx
        .orders
        .create_order(
            CreateSalesOrderRequest {
                customer_id,
                order_number: "SO-1002".to_string(),
                items: vec![OrderItemInput {
                    product_id: product.id,
                    quantity: 4,
                    unit_price: None,
                    discount: dec!(0),
                    notes: None,
                }],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .unwrap();

    assert_eq!(order.order.total_amount, dec!(29.00));
    assert_eq!(order.items[0].unit_price, dec!(7.25));
}

#[tokio::test]
async fn create_with_unknown_product_persists_nothing() {
    let ctx = common::setup().await;
    let customer_id = ctx.seed_customer("orders3@example.com").await;
    let product = ctx.seed_product("ORD-P4", dec!(10)).await;

    let err = ctx
        .orders
        .create_order(
            CreateSalesOrderRequest {
                customer_id,
                order_number: "SO-1003".to_string(),
                items: vec![
                    item(product.id, 1, dec!(10), dec!(0)),
                    item(Uuid::new_v4(), 1, dec!(10), dec!(0)),
                ],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    assert_matches!(
        ctx.orders.get_order_by_number("SO-1003").await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn status_only_update_leaves_items_and_total_unchanged() {
    let ctx = common::setup().await;
    let customer_id = ctx.seed_customer("orders4@example.com").await;
    let product = ctx.seed_product("ORD-P5", dec!(12)).await;

    let created = ctx
        .orders
        .create_order(
            CreateSalesOrderRequest {
                customer_id,
                order_number: "SO-1004".to_string(),
                items: vec![item(product.id, 3, dec!(12), dec!(0))],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .unwrap();

    let updated = ctx
        .orders
        .update_order(
            created.order.id,
            UpdateSalesOrderRequest {
                status: Some(SalesOrderStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.order.status, SalesOrderStatus::Cancelled);
    assert_eq!(updated.order.total_amount, created.order.total_amount);
    assert_eq!(updated.items.len(), created.items.len());
    assert_eq!(updated.items[0].id, created.items[0].id);
}

#[tokio::test]
async fn item_patch_replaces_full_set_and_recomputes_total() {
    let ctx = common::setup().await;
    let customer_id = ctx.seed_customer("orders5@example.com").await;
    let p1 = ctx.seed_product("ORD-P6", dec!(10)).await;
    let p2 = ctx.seed_product("ORD-P7", dec!(3)).await;

    let created = ctx
        .orders
        .create_order(
            CreateSalesOrderRequest {
                customer_id,
                order_number: "SO-1005".to_string(),
                items: vec![item(p1.id, 2, dec!(10), dec!(0))],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .unwrap();
    assert_eq!(created.order.total_amount, dec!(20));

    let updated = ctx
        .orders
        .update_order(
            created.order.id,
            UpdateSalesOrderRequest {
                items: Some(vec![item(p2.id, 5, dec!(3), dec!(0))]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.order.total_amount, dec!(15));
    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].product_id, p2.id);
}

#[tokio::test]
async fn item_patch_with_unknown_product_is_atomic() {
    let ctx = common::setup().await;
    let customer_id = ctx.seed_customer("orders6@example.com").await;
    let product = ctx.seed_product("ORD-P8", dec!(10)).await;

    let created = ctx
        .orders
        .create_order(
            CreateSalesOrderRequest {
                customer_id,
                order_number: "SO-1006".to_string(),
                items: vec![item(product.id, 2, dec!(10), dec!(0))],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .unwrap();

    let err = ctx
        .orders
        .update_order(
            created.order.id,
            UpdateSalesOrderRequest {
                items: Some(vec![
                    item(product.id, 1, dec!(10), dec!(0)),
                    item(Uuid::new_v4(), 1, dec!(10), dec!(0)),
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    // Existing header and items are fully intact.
    let reloaded = ctx.orders.get_order(created.order.id).await.unwrap();
    assert_eq!(reloaded.order.total_amount, dec!(20));
    assert_eq!(reloaded.items.len(), 1);
    assert_eq!(reloaded.items[0].id, created.items[0].id);
}

#[tokio::test]
async fn illegal_status_transition_is_rejected() {
    let ctx = common::setup().await;
    let customer_id = ctx.seed_customer("orders7@example.com").await;
    let product = ctx.seed_product("ORD-P9", dec!(10)).await;

    let created = ctx
        .orders
        .create_order(
            CreateSalesOrderRequest {
                customer_id,
                order_number: "SO-1007".to_string(),
                items: vec![item(product.id, 1, dec!(10), dec!(0))],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .unwrap();

    ctx.orders
        .update_order(
            created.order.id,
            UpdateSalesOrderRequest {
                status: Some(SalesOrderStatus::Delivered),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = ctx
        .orders
        .update_order(
            created.order.id,
            UpdateSalesOrderRequest {
                status: Some(SalesOrderStatus::Confirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn duplicate_order_number_is_a_conflict() {
    let ctx = common::setup().await;
    let customer_id = ctx.seed_customer("orders8@example.com").await;
    let product = ctx.seed_product("ORD-P10", dec!(10)).await;

    let request = |n: &str| CreateSalesOrderRequest {
        customer_id,
        order_number: n.to_string(),
        items: vec![item(product.id, 1, dec!(10), dec!(0))],
        notes: None,
    };

    ctx.orders
        .create_order(request("SO-1008"), ctx.actor)
        .await
        .unwrap();
    let err = ctx
        .orders
        .create_order(request("SO-1008"), ctx.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn discount_outside_unit_interval_is_rejected() {
    let ctx = common::setup().await;
    let customer_id = ctx.seed_customer("orders9@example.com").await;
    let product = ctx.seed_product("ORD-P11", dec!(10)).await;

    let err = ctx
        .orders
        .create_order(
            CreateSalesOrderRequest {
                customer_id,
                order_number: "SO-1009".to_string(),
                items: vec![item(product.id, 1, dec!(10), dec!(1.5))],
                notes: None,
            },
            ctx.actor,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
