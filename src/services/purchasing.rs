use crate::{
    db::DbPool,
    entities::purchase_order::{
        self, ActiveModel as PurchaseOrderActiveModel, Entity as PurchaseOrderEntity,
        Model as PurchaseOrderModel, PurchaseOrderStatus,
    },
    entities::purchase_order_item::{
        self, ActiveModel as PurchaseOrderItemActiveModel, Entity as PurchaseOrderItemEntity,
        Model as PurchaseOrderItemModel,
    },
    entities::supplier::Entity as SupplierEntity,
    errors::ServiceError,
    services::orders::{line_total, resolve_products, OrderItemInput},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: Uuid,
    #[validate(length(min = 1, message = "Order number is required"))]
    pub order_number: String,
    pub expected_date: DateTime<Utc>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OrderItemInput>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdatePurchaseOrderRequest {
    pub status: Option<PurchaseOrderStatus>,
    pub expected_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// When present, replaces the full item set
    pub items: Option<Vec<OrderItemInput>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseOrderWithItems {
    #[serde(flatten)]
    pub order: PurchaseOrderModel,
    pub items: Vec<PurchaseOrderItemModel>,
}

/// Purchase order lifecycle, the procurement mirror of the sales order
/// service. Items default their unit price to the product's cost price.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(
        skip(self, request),
        fields(supplier_id = %request.supplier_id, order_number = %request.order_number)
    )]
    pub async fn create_purchase_order(
        &self,
        request: CreatePurchaseOrderRequest,
        created_by: Uuid,
    ) -> Result<PurchaseOrderWithItems, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start purchase order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        SupplierEntity::find_by_id(request.supplier_id)
            .one(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", request.supplier_id))
            })?;

        let products = resolve_products(&txn, &request.items).await?;

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let mut total = Decimal::ZERO;
        let mut item_models = Vec::with_capacity(request.items.len());
        for input in &request.items {
            let unit_price = input
                .unit_price
                .unwrap_or(products[&input.product_id].cost_price);
            let item_total = line_total(input.quantity, unit_price, input.discount)?;
            total += item_total;
            item_models.push(PurchaseOrderItemActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(input.product_id),
                quantity: Set(input.quantity),
                unit_price: Set(unit_price),
                discount: Set(input.discount),
                total_amount: Set(item_total),
                notes: Set(input.notes.clone()),
            });
        }

        let order = PurchaseOrderActiveModel {
            id: Set(order_id),
            supplier_id: Set(request.supplier_id),
            order_number: Set(request.order_number),
            order_date: Set(now),
            expected_date: Set(request.expected_date),
            status: Set(PurchaseOrderStatus::Draft),
            total_amount: Set(total),
            notes: Set(request.notes),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert purchase order");
            ServiceError::from_db(e)
        })?;

        PurchaseOrderItemEntity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        let items = PurchaseOrderItemEntity::find()
            .filter(purchase_order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit purchase order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, total = %order.total_amount, "Purchase order created");
        Ok(PurchaseOrderWithItems { order, items })
    }

    pub async fn get_purchase_order(&self, id: Uuid) -> Result<PurchaseOrderWithItems, ServiceError> {
        let order = PurchaseOrderEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {id} not found")))?;
        let items = self.get_purchase_order_items(id).await?;
        Ok(PurchaseOrderWithItems { order, items })
    }

    pub async fn get_purchase_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<PurchaseOrderWithItems, ServiceError> {
        let order = PurchaseOrderEntity::find()
            .filter(purchase_order::Column::OrderNumber.eq(order_number))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {order_number} not found"))
            })?;
        let items = self.get_purchase_order_items(order.id).await?;
        Ok(PurchaseOrderWithItems { order, items })
    }

    pub async fn get_purchase_order_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderItemModel>, ServiceError> {
        PurchaseOrderItemEntity::find()
            .filter(purchase_order_item::Column::OrderId.eq(order_id))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        supplier_id: Option<Uuid>,
        status: Option<PurchaseOrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<PurchaseOrderModel>, u64), ServiceError> {
        let mut query =
            PurchaseOrderEntity::find().order_by_desc(purchase_order::Column::OrderDate);
        if let Some(supplier_id) = supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }
        if let Some(status) = status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((orders, total))
    }

    /// Partial update with the same atomicity rules as sales orders: status
    /// changes are transition-checked and an `items` patch resolves every
    /// product before the existing rows are replaced.
    #[instrument(skip(self, request), fields(order_id = %id))]
    pub async fn update_purchase_order(
        &self,
        id: Uuid,
        request: UpdatePurchaseOrderRequest,
    ) -> Result<PurchaseOrderWithItems, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start purchase order update transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = PurchaseOrderEntity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {id} not found")))?;

        if let Some(next) = request.status {
            if !order.status.can_transition_to(next) {
                return Err(ServiceError::InvalidOperation(format!(
                    "Cannot transition purchase order from {} to {}",
                    order.status, next
                )));
            }
        }

        let staged_items = match &request.items {
            Some(items) => {
                if items.is_empty() {
                    return Err(ServiceError::ValidationError(
                        "At least one item is required".to_string(),
                    ));
                }
                let products = resolve_products(&txn, items).await?;
                let mut total = Decimal::ZERO;
                let mut models = Vec::with_capacity(items.len());
                for input in items {
                    let unit_price = input
                        .unit_price
                        .unwrap_or(products[&input.product_id].cost_price);
                    let item_total = line_total(input.quantity, unit_price, input.discount)?;
                    total += item_total;
                    models.push(PurchaseOrderItemActiveModel {
                        id: Set(Uuid::new_v4()),
                        order_id: Set(id),
                        product_id: Set(input.product_id),
                        quantity: Set(input.quantity),
                        unit_price: Set(unit_price),
                        discount: Set(input.discount),
                        total_amount: Set(item_total),
                        notes: Set(input.notes.clone()),
                    });
                }
                Some((models, total))
            }
            None => None,
        };

        let mut model: PurchaseOrderActiveModel = order.into();
        if let Some(status) = request.status {
            model.status = Set(status);
        }
        if let Some(expected_date) = request.expected_date {
            model.expected_date = Set(expected_date);
        }
        if let Some(notes) = request.notes {
            model.notes = Set(Some(notes));
        }
        if let Some((item_models, total)) = staged_items {
            PurchaseOrderItemEntity::delete_many()
                .filter(purchase_order_item::Column::OrderId.eq(id))
                .exec(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            PurchaseOrderItemEntity::insert_many(item_models)
                .exec(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            model.total_amount = Set(total);
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model.update(&txn).await.map_err(ServiceError::from_db)?;
        let items = PurchaseOrderItemEntity::find()
            .filter(purchase_order_item::Column::OrderId.eq(id))
            .all(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %id, "Failed to commit purchase order update");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %id, status = %updated.status, "Purchase order updated");
        Ok(PurchaseOrderWithItems {
            order: updated,
            items,
        })
    }
}
