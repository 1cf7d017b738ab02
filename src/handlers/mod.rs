//! HTTP handlers, one module per domain area, plus shared helpers.

pub mod billing;
pub mod common;
pub mod customers;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod purchasing;
pub mod suppliers;

use crate::db::DbPool;
use crate::services::{
    BillingService, CatalogService, CustomerService, InventoryService, PurchaseOrderService,
    ReceivingService, SalesOrderService, SupplierService,
};
use std::sync::Arc;

/// All domain services, constructed once over a shared connection pool and
/// cloned into the application state.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub inventory: InventoryService,
    pub customers: CustomerService,
    pub orders: SalesOrderService,
    pub billing: BillingService,
    pub suppliers: SupplierService,
    pub purchasing: PurchaseOrderService,
    pub receiving: ReceivingService,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            catalog: CatalogService::new(db_pool.clone()),
            inventory: InventoryService::new(db_pool.clone()),
            customers: CustomerService::new(db_pool.clone()),
            orders: SalesOrderService::new(db_pool.clone()),
            billing: BillingService::new(db_pool.clone()),
            suppliers: SupplierService::new(db_pool.clone()),
            purchasing: PurchaseOrderService::new(db_pool.clone()),
            receiving: ReceivingService::new(db_pool),
        }
    }
}
