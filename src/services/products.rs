use crate::{
    db::DbPool,
    entities::category::{
        ActiveModel as CategoryActiveModel, Entity as CategoryEntity, Model as CategoryModel,
    },
    entities::product::{
        self, ActiveModel as ProductActiveModel, Entity as ProductEntity, Model as ProductModel,
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "SKU is required"))]
    pub sku: String,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    #[validate(length(min = 1, message = "Unit of measure is required"))]
    pub unit_of_measure: String,
    #[serde(default)]
    pub min_stock_level: i32,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub unit_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub unit_of_measure: Option<String>,
    pub min_stock_level: Option<i32>,
    pub is_active: Option<bool>,
}

/// Catalog maintenance: categories and products.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryModel, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        if let Some(parent_id) = request.parent_id {
            CategoryEntity::find_by_id(parent_id)
                .one(db)
                .await
                .map_err(ServiceError::from_db)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Parent category {parent_id} not found"))
                })?;
        }

        let now = Utc::now();
        let category = CategoryActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            parent_id: Set(request.parent_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create category");
            ServiceError::from_db(e)
        })?;

        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<CategoryModel, ServiceError> {
        CategoryEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CategoryModel>, u64), ServiceError> {
        let paginator = CategoryEntity::find()
            .order_by_asc(crate::entities::category::Column::Name)
            .paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let categories = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((categories, total))
    }

    #[instrument(skip(self, request), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<CategoryModel, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get_category(id).await?;

        let mut category: CategoryActiveModel = existing.into();
        if let Some(name) = request.name {
            category.name = Set(name);
        }
        if let Some(description) = request.description {
            category.description = Set(Some(description));
        }
        if let Some(parent_id) = request.parent_id {
            CategoryEntity::find_by_id(parent_id)
                .one(db)
                .await
                .map_err(ServiceError::from_db)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Parent category {parent_id} not found"))
                })?;
            category.parent_id = Set(Some(parent_id));
        }
        if let Some(is_active) = request.is_active {
            category.is_active = Set(is_active);
        }
        category.updated_at = Set(Some(Utc::now()));

        let updated = category.update(db).await.map_err(ServiceError::from_db)?;
        info!(category_id = %id, "Category updated");
        Ok(updated)
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductModel, ServiceError> {
        request.validate()?;
        if request.unit_price < Decimal::ZERO || request.cost_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Prices must not be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        if let Some(category_id) = request.category_id {
            CategoryEntity::find_by_id(category_id)
                .one(db)
                .await
                .map_err(ServiceError::from_db)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Category {category_id} not found"))
                })?;
        }

        let now = Utc::now();
        let product = ProductActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(request.sku),
            name: Set(request.name),
            description: Set(request.description),
            category_id: Set(request.category_id),
            unit_price: Set(request.unit_price),
            cost_price: Set(request.cost_price),
            unit_of_measure: Set(request.unit_of_measure),
            min_stock_level: Set(request.min_stock_level),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create product");
            ServiceError::from_db(e)
        })?;

        info!(product_id = %product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        ProductEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    pub async fn get_product_by_sku(&self, sku: &str) -> Result<ProductModel, ServiceError> {
        ProductEntity::find()
            .filter(product::Column::Sku.eq(sku))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with SKU {sku} not found")))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category_id: Option<Uuid>,
        is_active: Option<bool>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        let mut query = ProductEntity::find().order_by_asc(product::Column::Sku);
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(is_active) = is_active {
            query = query.filter(product::Column::IsActive.eq(is_active));
        }

        let paginator = query.paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let products = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((products, total))
    }

    #[instrument(skip(self, request), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductModel, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get_product(id).await?;

        if let Some(price) = request.unit_price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Unit price must not be negative".to_string(),
                ));
            }
        }
        if let Some(price) = request.cost_price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Cost price must not be negative".to_string(),
                ));
            }
        }
        if let Some(category_id) = request.category_id {
            CategoryEntity::find_by_id(category_id)
                .one(db)
                .await
                .map_err(ServiceError::from_db)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Category {category_id} not found"))
                })?;
        }

        let mut model: ProductActiveModel = existing.into();
        if let Some(name) = request.name {
            model.name = Set(name);
        }
        if let Some(description) = request.description {
            model.description = Set(Some(description));
        }
        if let Some(category_id) = request.category_id {
            model.category_id = Set(Some(category_id));
        }
        if let Some(unit_price) = request.unit_price {
            model.unit_price = Set(unit_price);
        }
        if let Some(cost_price) = request.cost_price {
            model.cost_price = Set(cost_price);
        }
        if let Some(unit_of_measure) = request.unit_of_measure {
            model.unit_of_measure = Set(unit_of_measure);
        }
        if let Some(min_stock_level) = request.min_stock_level {
            model.min_stock_level = Set(min_stock_level);
        }
        if let Some(is_active) = request.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model.update(db).await.map_err(ServiceError::from_db)?;
        info!(product_id = %id, "Product updated");
        Ok(updated)
    }
}
