use crate::{
    db::DbPool,
    entities::invoice::{
        self, ActiveModel as InvoiceActiveModel, Entity as InvoiceEntity, Model as InvoiceModel,
        PaymentStatus,
    },
    entities::payment::{
        self, ActiveModel as PaymentActiveModel, Entity as PaymentEntity, Model as PaymentModel,
    },
    entities::sales_order::{Entity as OrderEntity, SalesOrderStatus},
    errors::ServiceError,
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
pub struct CreateInvoiceRequest {
    pub order_id: Uuid,
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,
    pub due_date: DateTime<Utc>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Invoices and their payments. An invoice can only be raised against a
/// confirmed order; `payment_status` is derived from cumulative payments and
/// is never written by callers.
#[derive(Clone)]
pub struct BillingService {
    db_pool: Arc<DbPool>,
}

impl BillingService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(
        skip(self, request),
        fields(order_id = %request.order_id, invoice_number = %request.invoice_number)
    )]
    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
        created_by: Uuid,
    ) -> Result<InvoiceModel, ServiceError> {
        request.validate()?;
        if request.total_amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Invoice total must be positive".to_string(),
            ));
        }
        if request.tax_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Tax amount must not be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let order = OrderEntity::find_by_id(request.order_id)
            .one(db)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", request.order_id))
            })?;
        if order.status != SalesOrderStatus::Confirmed {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot invoice order in status {}; order must be confirmed",
                order.status
            )));
        }

        let now = Utc::now();
        let invoice = InvoiceActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(request.order_id),
            invoice_number: Set(request.invoice_number),
            invoice_date: Set(now),
            due_date: Set(request.due_date),
            total_amount: Set(request.total_amount),
            tax_amount: Set(request.tax_amount),
            payment_status: Set(PaymentStatus::Pending),
            notes: Set(request.notes),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create invoice");
            ServiceError::from_db(e)
        })?;

        info!(invoice_id = %invoice.id, order_id = %invoice.order_id, "Invoice created");
        Ok(invoice)
    }

    pub async fn get_invoice(&self, id: Uuid) -> Result<InvoiceModel, ServiceError> {
        InvoiceEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {id} not found")))
    }

    pub async fn get_invoice_by_number(
        &self,
        invoice_number: &str,
    ) -> Result<InvoiceModel, ServiceError> {
        InvoiceEntity::find()
            .filter(invoice::Column::InvoiceNumber.eq(invoice_number))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {invoice_number} not found")))
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        order_id: Option<Uuid>,
        payment_status: Option<PaymentStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<InvoiceModel>, u64), ServiceError> {
        let mut query = InvoiceEntity::find().order_by_desc(invoice::Column::InvoiceDate);
        if let Some(order_id) = order_id {
            query = query.filter(invoice::Column::OrderId.eq(order_id));
        }
        if let Some(payment_status) = payment_status {
            query = query.filter(invoice::Column::PaymentStatus.eq(payment_status));
        }

        let paginator = query.paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let invoices = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((invoices, total))
    }

    /// Partial update of the mutable invoice fields. Payment status is not
    /// among them; it only moves through `record_payment`.
    #[instrument(skip(self, request), fields(invoice_id = %id))]
    pub async fn update_invoice(
        &self,
        id: Uuid,
        request: UpdateInvoiceRequest,
    ) -> Result<InvoiceModel, ServiceError> {
        let existing = self.get_invoice(id).await?;
        let mut model: InvoiceActiveModel = existing.into();
        if let Some(due_date) = request.due_date {
            model.due_date = Set(due_date);
        }
        if let Some(notes) = request.notes {
            model.notes = Set(Some(notes));
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::from_db)?;
        info!(invoice_id = %id, "Invoice updated");
        Ok(updated)
    }

    /// Applies a payment to an invoice. The amount must not exceed the
    /// outstanding balance; the derived payment status is recomputed from the
    /// cumulative total including this payment, all in one transaction.
    #[instrument(skip(self, request), fields(invoice_id = %invoice_id, amount = %request.amount))]
    pub async fn record_payment(
        &self,
        invoice_id: Uuid,
        request: RecordPaymentRequest,
        created_by: Uuid,
    ) -> Result<PaymentModel, ServiceError> {
        request.validate()?;
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Payment amount must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start payment transaction");
            ServiceError::DatabaseError(e)
        })?;

        let invoice = InvoiceEntity::find_by_id(invoice_id)
            .one(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {invoice_id} not found")))?;

        let already_paid: Decimal = PaymentEntity::find()
            .filter(payment::Column::InvoiceId.eq(invoice_id))
            .all(&txn)
            .await
            .map_err(ServiceError::from_db)?
            .iter()
            .map(|p| p.amount)
            .sum();

        let outstanding = invoice.total_amount - already_paid;
        if request.amount > outstanding {
            return Err(ServiceError::InvalidOperation(format!(
                "Payment of {} exceeds outstanding balance of {}",
                request.amount, outstanding
            )));
        }

        let payment = PaymentActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id),
            amount: Set(request.amount),
            payment_date: Set(Utc::now()),
            payment_method: Set(request.payment_method),
            reference: Set(request.reference),
            notes: Set(request.notes),
            created_by: Set(created_by),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::from_db)?;

        let total_paid = already_paid + payment.amount;
        let next_status = PaymentStatus::from_amounts(total_paid, invoice.total_amount);
        let invoice_total = invoice.total_amount;
        let mut invoice_update: InvoiceActiveModel = invoice.into();
        invoice_update.payment_status = Set(next_status);
        invoice_update.updated_at = Set(Some(Utc::now()));
        invoice_update
            .update(&txn)
            .await
            .map_err(ServiceError::from_db)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, invoice_id = %invoice_id, "Failed to commit payment");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            payment_id = %payment.id,
            invoice_id = %invoice_id,
            total_paid = %total_paid,
            invoice_total = %invoice_total,
            status = %next_status,
            "Payment recorded"
        );
        Ok(payment)
    }

    #[instrument(skip(self))]
    pub async fn list_payments(
        &self,
        invoice_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<PaymentModel>, u64), ServiceError> {
        let paginator = PaymentEntity::find()
            .filter(payment::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(payment::Column::CreatedAt)
            .paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
        let payments = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from_db)?;
        Ok((payments, total))
    }
}
