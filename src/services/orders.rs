use crate::{
    db::DbPool,
    entities::customer::Entity as CustomerEntity,
    entities::product::{self, Entity as ProductEntity, Model as ProductModel},
    entities::sales_order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
        SalesOrderStatus,
    },
    entities::sales_order_item::{
        self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity,
        Model as OrderItemModel,
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
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Defaults to the product's current unit price
    pub unit_price: Option<Decimal>,
    /// Fraction in [0, 1], defaults to 0
    #[serde(default)]
    pub discount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateSalesOrderRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "Order number is required"))]
    pub order_number: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OrderItemInput>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateSalesOrderRequest {
    pub status: Option<SalesOrderStatus>,
    pub notes: Option<String>,
    /// When present, replaces the full item set
    pub items: Option<Vec<OrderItemInput>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

/// Line total for an order item: quantity × unit_price × (1 − discount).
pub(crate) fn line_total(
    quantity: i32,
    unit_price: Decimal,
    discount: Decimal,
) -> Result<Decimal, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "Item quantity must be positive".to_string(),
        ));
    }
    if unit_price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Unit price must not be negative".to_string(),
        ));
    }
    if discount < Decimal::ZERO || discount > Decimal::ONE {
        return Err(ServiceError::ValidationError(
            "Discount must be between 0 and 1".to_string(),
        ));
    }
    Ok(Decimal::from(quantity) * unit_price * (Decimal::ONE - discount))
}

/// Resolves every referenced product before anything is staged, so a single
/// unknown id aborts the whole mutation.
pub(crate) async fn resolve_products<C: ConnectionTrait>(
    conn: &C,
    items: &[OrderItemInput],
) -> Result<HashMap<Uuid, ProductModel>, ServiceError> {
    let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = ProductEntity::find()
        .filter(product::Column::Id.is_in(ids))
        .all(conn)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    for item in items {
        if !products.contains_key(&item.product_id) {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                item.product_id
            )));
        }
    }
    Ok(products)
}

/// Sales order lifecycle: creation, retrieval, partial updates with
/// transition-checked status changes and whole-set item replacement.
#[derive(Clone)]
pub struct SalesOrderService {
    db_pool: Arc<DbPool>,
}

impl SalesOrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(
        skip(self, request),
        fields(customer_id = %request.customer_id, order_number = %request.order_number)
    )]
    pub async fn create_order(
        &self,
        request: CreateSalesOrderRequest,
        created_by: Uuid,
    ) -> Result<OrderWithItems, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        CustomerEntity::find_by_id(request.customer_id)
            .one(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        let products = resolve_products(&txn, &request.items).await?;

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let mut total = Decimal::ZERO;
        let mut item_models = Vec::with_capacity(request.items.len());
        for input in &request.items {
            let unit_price = input
                .unit_price
                .unwrap_or(products[&input.product_id].unit_price);
            let item_total = line_total(input.quantity, unit_price, input.discount)?;
            total += item_total;
            item_models.push(OrderItemActiveModel {
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

        let order = OrderActiveModel {
            id: Set(order_id),
            customer_id: Set(request.customer_id),
            order_number: Set(request.order_number),
            order_date: Set(now),
            status: Set(SalesOrderStatus::Draft),
            total_amount: Set(total),
            notes: Set(request.notes),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert order");
            ServiceError::from_db(e)
        })?;

        OrderItemEntity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        let items = OrderItemEntity::find()
            .filter(sales_order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, total = %order.total_amount, "Sales order created");
        Ok(OrderWithItems { order, items })
    }

    pub async fn get_order(&self, id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let order = self.find_order(id).await?;
        let items = self.get_order_items(id).await?;
        Ok(OrderWithItems { order, items })
    }

    pub async fn get_order_by_number(&self, order_number: &str) -> Result<OrderWithItems, ServiceError> {
        let order = OrderEntity::find()
            .filter(sales_order::Column::OrderNumber.eq(order_number))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_number} not found")))?;
        let items = self.get_order_items(order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    pub async fn get_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItemModel>, ServiceError> {
        OrderItemEntity::find()
            .filter(sales_order_item::Column::OrderId.eq(order_id))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        customer_id: Option<Uuid>,
        status: Option<SalesOrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderModel>, u64), ServiceError> {
        let mut query = OrderEntity::find().order_by_desc(sales_order::Column::OrderDate);
        if let Some(customer_id) = customer_id {
            query = query.filter(sales_order::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = status {
            query = query.filter(sales_order::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((orders, total))
    }

    /// Partial update. A status change must be legal for the order's state
    /// machine; an `items` patch is resolved in full before any existing row
    /// is touched, then the old set is deleted and the new set inserted with
    /// the total recomputed from scratch.
    #[instrument(skip(self, request), fields(order_id = %id))]
    pub async fn update_order(
        &self,
        id: Uuid,
        request: UpdateSalesOrderRequest,
    ) -> Result<OrderWithItems, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start order update transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))?;

        if let Some(next) = request.status {
            if !order.status.can_transition_to(next) {
                return Err(ServiceError::InvalidOperation(format!(
                    "Cannot transition order from {} to {}",
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
                        .unwrap_or(products[&input.product_id].unit_price);
                    let item_total = line_total(input.quantity, unit_price, input.discount)?;
                    total += item_total;
                    models.push(OrderItemActiveModel {
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

        let mut model: OrderActiveModel = order.into();
        if let Some(status) = request.status {
            model.status = Set(status);
        }
        if let Some(notes) = request.notes {
            model.notes = Set(Some(notes));
        }
        if let Some((item_models, total)) = staged_items {
            OrderItemEntity::delete_many()
                .filter(sales_order_item::Column::OrderId.eq(id))
                .exec(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            OrderItemEntity::insert_many(item_models)
                .exec(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            model.total_amount = Set(total);
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model.update(&txn).await.map_err(ServiceError::from_db)?;
        let items = OrderItemEntity::find()
            .filter(sales_order_item::Column::OrderId.eq(id))
            .all(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %id, "Failed to commit order update");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %id, status = %updated.status, "Sales order updated");
        Ok(OrderWithItems {
            order: updated,
            items,
        })
    }

    async fn find_order(&self, id: Uuid) -> Result<OrderModel, ServiceError> {
        OrderEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn line_total_applies_discount() {
        assert_eq!(line_total(2, dec!(10), dec!(0)).unwrap(), dec!(20));
        assert_eq!(line_total(1, dec!(5), dec!(0.1)).unwrap(), dec!(4.5));
        // Full discount zeroes the line
        assert_eq!(line_total(3, dec!(7), dec!(1)).unwrap(), dec!(0));
    }

    #[test]
    fn line_total_rejects_bad_inputs() {
        assert_matches!(
            line_total(0, dec!(10), dec!(0)),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            line_total(1, dec!(-1), dec!(0)),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            line_total(1, dec!(10), dec!(1.01)),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            line_total(1, dec!(10), dec!(-0.1)),
            Err(ServiceError::ValidationError(_))
        );
    }
}
