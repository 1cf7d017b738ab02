use crate::{
    db::DbPool,
    entities::supplier::{
        self, ActiveModel as SupplierActiveModel, Entity as SupplierEntity, Model as SupplierModel,
        SupplierType,
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, message = "Supplier name is required"))]
    pub name: String,
    pub supplier_type: SupplierType,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    /// Days to pay
    pub payment_terms: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSupplierRequest {
    pub name: Option<String>,
    pub supplier_type: Option<SupplierType>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub payment_terms: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<SupplierModel, ServiceError> {
        request.validate()?;
        if matches!(request.payment_terms, Some(days) if days < 0) {
            return Err(ServiceError::ValidationError(
                "Payment terms must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let supplier = SupplierActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            supplier_type: Set(request.supplier_type),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            tax_id: Set(request.tax_id),
            payment_terms: Set(request.payment_terms),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create supplier");
            ServiceError::from_db(e)
        })?;

        info!(supplier_id = %supplier.id, "Supplier created");
        Ok(supplier)
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<SupplierModel, ServiceError> {
        SupplierEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {id} not found")))
    }

    pub async fn get_supplier_by_email(&self, email: &str) -> Result<SupplierModel, ServiceError> {
        SupplierEntity::find()
            .filter(supplier::Column::Email.eq(email))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier with email {email} not found")))
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        is_active: Option<bool>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<SupplierModel>, u64), ServiceError> {
        let mut query = SupplierEntity::find().order_by_asc(supplier::Column::Name);
        if let Some(is_active) = is_active {
            query = query.filter(supplier::Column::IsActive.eq(is_active));
        }

        let paginator = query.paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let suppliers = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((suppliers, total))
    }

    #[instrument(skip(self, request), fields(supplier_id = %id))]
    pub async fn update_supplier(
        &self,
        id: Uuid,
        request: UpdateSupplierRequest,
    ) -> Result<SupplierModel, ServiceError> {
        request.validate()?;
        if matches!(request.payment_terms, Some(days) if days < 0) {
            return Err(ServiceError::ValidationError(
                "Payment terms must not be negative".to_string(),
            ));
        }

        let existing = self.get_supplier(id).await?;
        let mut model: SupplierActiveModel = existing.into();
        if let Some(name) = request.name {
            model.name = Set(name);
        }
        if let Some(supplier_type) = request.supplier_type {
            model.supplier_type = Set(supplier_type);
        }
        if let Some(email) = request.email {
            model.email = Set(email);
        }
        if let Some(phone) = request.phone {
            model.phone = Set(Some(phone));
        }
        if let Some(address) = request.address {
            model.address = Set(Some(address));
        }
        if let Some(tax_id) = request.tax_id {
            model.tax_id = Set(Some(tax_id));
        }
        if let Some(payment_terms) = request.payment_terms {
            model.payment_terms = Set(Some(payment_terms));
        }
        if let Some(is_active) = request.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?;
        info!(supplier_id = %id, "Supplier updated");
        Ok(updated)
    }
}
