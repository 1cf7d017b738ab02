use crate::{
    db::DbPool,
    entities::product::Entity as ProductEntity,
    entities::stock::{self, ActiveModel as StockActiveModel, Entity as StockEntity, Model as StockModel},
    entities::stock_movement::{
        self, ActiveModel as MovementActiveModel, Entity as MovementEntity,
        Model as MovementModel, MovementType,
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateStockRequest {
    pub product_id: Uuid,
    #[validate(range(min = 0, message = "Initial quantity must not be negative"))]
    pub quantity: i32,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordMovementRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub movement_type: MovementType,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Stock accounting. Quantities change only through `record_movement`, which
/// appends to the movement ledger and applies the signed delta atomically.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates the stock row for a product. This is the only direct quantity
    /// write; later changes go through movements.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn create_stock(
        &self,
        request: CreateStockRequest,
    ) -> Result<StockModel, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        ProductEntity::find_by_id(request.product_id)
            .one(db)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;

        let stock = StockActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(request.product_id),
            quantity: Set(request.quantity),
            location: Set(request.location),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, product_id = %request.product_id, "Failed to create stock row");
            ServiceError::from_db(e)
        })?;

        info!(stock_id = %stock.id, product_id = %stock.product_id, "Stock row created");
        Ok(stock)
    }

    pub async fn get_stock_by_product(&self, product_id: Uuid) -> Result<StockModel, ServiceError> {
        StockEntity::find()
            .filter(stock::Column::ProductId.eq(product_id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No stock record for product {product_id}"))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_stock(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<StockModel>, u64), ServiceError> {
        let paginator = StockEntity::find()
            .order_by_asc(stock::Column::ProductId)
            .paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((rows, total))
    }

    /// Records a stock movement and applies its delta to the on-hand
    /// quantity. The stock row is lazily created at quantity 0, location
    /// "default", when the product has never been stocked. An `out` movement
    /// that would drive the quantity below zero is rejected and nothing is
    /// persisted.
    #[instrument(
        skip(self, request),
        fields(product_id = %request.product_id, movement_type = %request.movement_type)
    )]
    pub async fn record_movement(
        &self,
        request: RecordMovementRequest,
        created_by: Uuid,
    ) -> Result<MovementModel, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start movement transaction");
            ServiceError::DatabaseError(e)
        })?;

        ProductEntity::find_by_id(request.product_id)
            .one(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;

        let stock = self
            .find_or_create_stock(&txn, request.product_id)
            .await?;

        let new_quantity = stock.quantity + request.movement_type.delta(request.quantity);
        if new_quantity < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "Cannot remove {} units of product {}; only {} on hand",
                request.quantity, request.product_id, stock.quantity
            )));
        }

        let movement = MovementActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(request.product_id),
            quantity: Set(request.quantity),
            movement_type: Set(request.movement_type),
            reference: Set(request.reference),
            notes: Set(request.notes),
            created_by: Set(created_by),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::from_db)?;

        let mut stock_update: StockActiveModel = stock.into();
        stock_update.quantity = Set(new_quantity);
        stock_update.updated_at = Set(Some(Utc::now()));
        stock_update
            .update(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit movement transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            quantity = movement.quantity,
            new_quantity,
            "Stock movement recorded"
        );
        Ok(movement)
    }

    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        product_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<MovementModel>, u64), ServiceError> {
        let paginator = MovementEntity::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .order_by_desc(stock_movement::Column::CreatedAt)
            .paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let movements = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((movements, total))
    }

    async fn find_or_create_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
    ) -> Result<StockModel, ServiceError> {
        let existing = StockEntity::find()
            .filter(stock::Column::ProductId.eq(product_id))
            .one(conn)
            .await
            .map_err(ServiceError::from_db)?;

        match existing {
            Some(stock) => Ok(stock),
            None => StockActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                quantity: Set(0),
                location: Set("default".to_string()),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
            }
            .insert(conn)
            .await
            .map_err(ServiceError::from_db),
        }
    }
}
