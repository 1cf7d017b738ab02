mod common;

use assert_matches::assert_matches;
use ledgerline_api::entities::stock_movement::MovementType;
use ledgerline_api::errors::ServiceError;
use ledgerline_api::services::inventory::RecordMovementRequest;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn movement(product_id: Uuid, quantity: i32, movement_type: MovementType) -> RecordMovementRequest {
    RecordMovementRequest {
        product_id,
        quantity,
        movement_type,
        reference: None,
        notes: None,
    }
}

#[tokio::test]
async fn inbound_then_outbound_movements_adjust_quantity() {
    let ctx = common::setup().await;
    let product = ctx.seed_product("SKU-001", dec!(10)).await;

    ctx.inventory
        .record_movement(movement(product.id, 50, MovementType::In), ctx.actor)
        .await
        .expect("inbound movement");
    ctx.inventory
        .record_movement(movement(product.id, 20, MovementType::Out), ctx.actor)
        .await
        .expect("outbound movement");

    let stock = ctx
        .inventory
        .get_stock_by_product(product.id)
        .await
        .expect("stock row");
    assert_eq!(stock.quantity, 30);
    assert_eq!(stock.location, "default");
}

#[tokio::test]
async fn equal_in_and_out_restore_prior_quantity() {
    let ctx = common::setup().await;
    let product = ctx.seed_product("SKU-002", dec!(10)).await;

    ctx.inventory
        .record_movement(movement(product.id, 75, MovementType::In), ctx.actor)
        .await
        .unwrap();
    let before = ctx
        .inventory
        .get_stock_by_product(product.id)
        .await
        .unwrap()
        .quantity;

    ctx.inventory
        .record_movement(movement(product.id, 25, MovementType::In), ctx.actor)
        .await
        .unwrap();
    ctx.inventory
        .record_movement(movement(product.id, 25, MovementType::Out), ctx.actor)
        .await
        .unwrap();

    let after = ctx
        .inventory
        .get_stock_by_product(product.id)
        .await
        .unwrap()
        .quantity;
    assert_eq!(after, before);
}

#[tokio::test]
async fn overdraw_is_rejected_and_persists_nothing() {
    let ctx = common::setup().await;
    let product = ctx.seed_product("SKU-003", dec!(10)).await;

    ctx.inventory
        .record_movement(movement(product.id, 10, MovementType::In), ctx.actor)
        .await
        .unwrap();

    let err = ctx
        .inventory
        .record_movement(movement(product.id, 11, MovementType::Out), ctx.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Quantity and ledger are untouched by the failed movement.
    let stock = ctx
        .inventory
        .get_stock_by_product(product.id)
        .await
        .unwrap();
    assert_eq!(stock.quantity, 10);
    let (movements, total) = ctx
        .inventory
        .list_movements(product.id, 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(movements.len(), 1);
}

#[tokio::test]
async fn movement_for_unknown_product_is_rejected() {
    let ctx = common::setup().await;

    let err = ctx
        .inventory
        .record_movement(movement(Uuid::new_v4(), 5, MovementType::In), ctx.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn first_movement_lazily_creates_stock_row() {
    let ctx = common::setup().await;
    let product = ctx.seed_product("SKU-004", dec!(10)).await;

    // No stock row yet
    assert_matches!(
        ctx.inventory.get_stock_by_product(product.id).await,
        Err(ServiceError::NotFound(_))
    );

    ctx.inventory
        .record_movement(movement(product.id, 5, MovementType::In), ctx.actor)
        .await
        .unwrap();

    let stock = ctx
        .inventory
        .get_stock_by_product(product.id)
        .await
        .unwrap();
    assert_eq!(stock.quantity, 5);
    assert_eq!(stock.location, "default");
}

#[tokio::test]
async fn non_positive_movement_quantity_is_rejected() {
    let ctx = common::setup().await;
    let product = ctx.seed_product("SKU-005", dec!(10)).await;

    let err = ctx
        .inventory
        .record_movement(movement(product.id, 0, MovementType::In), ctx.actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
