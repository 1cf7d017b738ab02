use crate::{
    db::DbPool,
    entities::purchase_order::{
        ActiveModel as PurchaseOrderActiveModel, Entity as PurchaseOrderEntity,
        PurchaseOrderStatus,
    },
    entities::purchase_order_item::{
        self, Entity as PurchaseOrderItemEntity, Model as PurchaseOrderItemModel,
    },
    entities::purchase_receipt::{
        self, ActiveModel as ReceiptActiveModel, Entity as ReceiptEntity, Model as ReceiptModel,
        ReceiptStatus,
    },
    entities::purchase_receipt_item::{
        self, ActiveModel as ReceiptItemActiveModel, Entity as ReceiptItemEntity,
        Model as ReceiptItemModel,
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptItemInput {
    pub order_item_id: Uuid,
    pub quantity: i32,
    /// Defaults to the order item's unit price
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateReceiptRequest {
    #[validate(length(min = 1, message = "Receipt number is required"))]
    pub receipt_number: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<ReceiptItemInput>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptWithItems {
    #[serde(flatten)]
    pub receipt: ReceiptModel,
    pub items: Vec<ReceiptItemModel>,
}

/// Goods receiving against confirmed purchase orders. Receipts drive the
/// order's transition to Received once cumulative receipt totals cover the
/// order total.
#[derive(Clone)]
pub struct ReceivingService {
    db_pool: Arc<DbPool>,
}

impl ReceivingService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Records a receipt against a confirmed purchase order. Every line must
    /// reference an item of that order, and the cumulative received quantity
    /// per line (earlier receipts plus this one) must not exceed the ordered
    /// quantity. Any violation aborts the whole receipt.
    #[instrument(
        skip(self, request),
        fields(order_id = %order_id, receipt_number = %request.receipt_number)
    )]
    pub async fn create_receipt(
        &self,
        order_id: Uuid,
        request: CreateReceiptRequest,
        created_by: Uuid,
    ) -> Result<ReceiptWithItems, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start receipt transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = PurchaseOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {order_id} not found")))?;
        if order.status != PurchaseOrderStatus::Confirmed {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot receive against purchase order in status {}; order must be confirmed",
                order.status
            )));
        }

        let order_items: HashMap<Uuid, PurchaseOrderItemModel> = PurchaseOrderItemEntity::find()
            .filter(purchase_order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        let already_received = self.received_quantities(&txn, order_id).await?;

        // Validate every line before anything is staged.
        let mut requested: HashMap<Uuid, i32> = HashMap::new();
        for input in &request.items {
            if input.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "Receipt quantity must be positive".to_string(),
                ));
            }
            let order_item = order_items.get(&input.order_item_id).ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Order item {} does not belong to purchase order {order_id}",
                    input.order_item_id
                ))
            })?;
            if let Some(price) = input.unit_price {
                if price < Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "Unit price must not be negative".to_string(),
                    ));
                }
            }

            let pending = requested.entry(input.order_item_id).or_insert(0);
            *pending += input.quantity;
            let prior = already_received
                .get(&input.order_item_id)
                .copied()
                .unwrap_or(0);
            if prior + *pending > order_item.quantity {
                return Err(ServiceError::InvalidOperation(format!(
                    "Receiving {} units of order item {} exceeds the ordered quantity {} ({} already received)",
                    *pending, input.order_item_id, order_item.quantity, prior
                )));
            }
        }

        let receipt_id = Uuid::new_v4();
        let now = Utc::now();
        let mut total = Decimal::ZERO;
        let mut item_models = Vec::with_capacity(request.items.len());
        for input in &request.items {
            let order_item = &order_items[&input.order_item_id];
            let unit_price = input.unit_price.unwrap_or(order_item.unit_price);
            // No discount on receipts
            let item_total = Decimal::from(input.quantity) * unit_price;
            total += item_total;
            item_models.push(ReceiptItemActiveModel {
                id: Set(Uuid::new_v4()),
                receipt_id: Set(receipt_id),
                order_item_id: Set(input.order_item_id),
                quantity: Set(input.quantity),
                unit_price: Set(unit_price),
                total_amount: Set(item_total),
                notes: Set(input.notes.clone()),
            });
        }

        let receipt = ReceiptActiveModel {
            id: Set(receipt_id),
            order_id: Set(order_id),
            receipt_number: Set(request.receipt_number),
            receipt_date: Set(now),
            status: Set(ReceiptStatus::Received),
            total_amount: Set(total),
            notes: Set(request.notes),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, receipt_id = %receipt_id, "Failed to insert receipt");
            ServiceError::from_db(e)
        })?;

        ReceiptItemEntity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        // Prior receipt totals plus this receipt.
        let received_total: Decimal = ReceiptEntity::find()
            .filter(purchase_receipt::Column::OrderId.eq(order_id))
            .filter(purchase_receipt::Column::Status.eq(ReceiptStatus::Received))
            .all(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .iter()
            .map(|r| r.total_amount)
            .sum();

        let order_total = order.total_amount;
        if received_total >= order_total {
            let mut order_update: PurchaseOrderActiveModel = order.into();
            order_update.status = Set(PurchaseOrderStatus::Received);
            order_update.updated_at = Set(Some(now));
            order_update
                .update(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            info!(order_id = %order_id, "Purchase order fully received");
        }

        let items = ReceiptItemEntity::find()
            .filter(purchase_receipt_item::Column::ReceiptId.eq(receipt_id))
            .all(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, receipt_id = %receipt_id, "Failed to commit receipt");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            receipt_id = %receipt_id,
            order_id = %order_id,
            total = %receipt.total_amount,
            "Receipt recorded"
        );
        Ok(ReceiptWithItems { receipt, items })
    }

    pub async fn get_receipt(&self, id: Uuid) -> Result<ReceiptWithItems, ServiceError> {
        let receipt = ReceiptEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Receipt {id} not found")))?;
        let items = self.receipt_items(receipt.id).await?;
        Ok(ReceiptWithItems { receipt, items })
    }

    pub async fn get_receipt_by_number(
        &self,
        receipt_number: &str,
    ) -> Result<ReceiptWithItems, ServiceError> {
        let receipt = ReceiptEntity::find()
            .filter(purchase_receipt::Column::ReceiptNumber.eq(receipt_number))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Receipt {receipt_number} not found")))?;
        let items = self.receipt_items(receipt.id).await?;
        Ok(ReceiptWithItems { receipt, items })
    }

    #[instrument(skip(self))]
    pub async fn list_receipts(
        &self,
        order_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ReceiptModel>, u64), ServiceError> {
        let mut query = ReceiptEntity::find().order_by_desc(purchase_receipt::Column::ReceiptDate);
        if let Some(order_id) = order_id {
            query = query.filter(purchase_receipt::Column::OrderId.eq(order_id));
        }

        let paginator = query.paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let receipts = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((receipts, total))
    }

    async fn receipt_items(&self, receipt_id: Uuid) -> Result<Vec<ReceiptItemModel>, ServiceError> {
        ReceiptItemEntity::find()
            .filter(purchase_receipt_item::Column::ReceiptId.eq(receipt_id))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)
    }

    /// Cumulative received quantity per order item across the order's
    /// non-cancelled receipts.
    async fn received_quantities<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
    ) -> Result<HashMap<Uuid, i32>, ServiceError> {
        let receipt_ids: Vec<Uuid> = ReceiptEntity::find()
            .filter(purchase_receipt::Column::OrderId.eq(order_id))
            .filter(purchase_receipt::Column::Status.eq(ReceiptStatus::Received))
            .all(conn)
            .await
            .map_err(ServiceError::from_db)?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let mut totals: HashMap<Uuid, i32> = HashMap::new();
        if receipt_ids.is_empty() {
            return Ok(totals);
        }
        let items = ReceiptItemEntity::find()
            .filter(purchase_receipt_item::Column::ReceiptId.is_in(receipt_ids))
            .all(conn)
            .await
            .map_err(ServiceError::from_db)?;
        for item in items {
            *totals.entry(item.order_item_id).or_insert(0) += item.quantity;
        }
        Ok(totals)
    }
}
