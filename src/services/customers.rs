use crate::{
    db::DbPool,
    entities::customer::{
        self, ActiveModel as CustomerActiveModel, CustomerType, Entity as CustomerEntity,
        Model as CustomerModel,
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
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    pub customer_type: CustomerType,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    #[serde(default)]
    pub credit_limit: Decimal,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub customer_type: Option<CustomerType>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub credit_limit: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CustomerModel, ServiceError> {
        request.validate()?;
        if request.credit_limit < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Credit limit must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let customer = CustomerActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            customer_type: Set(request.customer_type),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            tax_id: Set(request.tax_id),
            credit_limit: Set(request.credit_limit),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create customer");
            ServiceError::from_db(e)
        })?;

        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<CustomerModel, ServiceError> {
        CustomerEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {id} not found")))
    }

    pub async fn get_customer_by_email(&self, email: &str) -> Result<CustomerModel, ServiceError> {
        CustomerEntity::find()
            .filter(customer::Column::Email.eq(email))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer with email {email} not found")))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        is_active: Option<bool>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CustomerModel>, u64), ServiceError> {
        let mut query = CustomerEntity::find().order_by_asc(customer::Column::Name);
        if let Some(is_active) = is_active {
            query = query.filter(customer::Column::IsActive.eq(is_active));
        }

        let paginator = query.paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let customers = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((customers, total))
    }

    #[instrument(skip(self, request), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerModel, ServiceError> {
        request.validate()?;
        if let Some(limit) = request.credit_limit {
            if limit < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Credit limit must not be negative".to_string(),
                ));
            }
        }

        let existing = self.get_customer(id).await?;
        let mut model: CustomerActiveModel = existing.into();
        if let Some(name) = request.name {
            model.name = Set(name);
        }
        if let Some(customer_type) = request.customer_type {
            model.customer_type = Set(customer_type);
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
        if let Some(credit_limit) = request.credit_limit {
            model.credit_limit = Set(credit_limit);
        }
        if let Some(is_active) = request.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?;
        info!(customer_id = %id, "Customer updated");
        Ok(updated)
    }
}
