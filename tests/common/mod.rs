#![allow(dead_code)]

use ledgerline_api::db::{self, DbConfig, DbPool};
use ledgerline_api::entities::customer::CustomerType;
use ledgerline_api::entities::product::Model as ProductModel;
use ledgerline_api::entities::supplier::SupplierType;
use ledgerline_api::services::customers::CreateCustomerRequest;
use ledgerline_api::services::products::CreateProductRequest;
use ledgerline_api::services::suppliers::CreateSupplierRequest;
use ledgerline_api::services::{
    BillingService, CatalogService, CustomerService, InventoryService, PurchaseOrderService,
    ReceivingService, SalesOrderService, SupplierService,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Fully wired service set over a fresh in-memory database with the schema
/// applied.
pub struct TestContext {
    pub db: Arc<DbPool>,
    pub catalog: CatalogService,
    pub inventory: InventoryService,
    pub customers: CustomerService,
    pub orders: SalesOrderService,
    pub billing: BillingService,
    pub suppliers: SupplierService,
    pub purchasing: PurchaseOrderService,
    pub receiving: ReceivingService,
    pub actor: Uuid,
}

pub async fn setup() -> TestContext {
    // A single connection keeps every statement on the same in-memory
    // database.
    let cfg = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&cfg)
        .await
        .expect("connect in-memory sqlite");
    db::run_migrations(&pool).await.expect("run migrations");

    let db = Arc::new(pool);
    TestContext {
        catalog: CatalogService::new(db.clone()),
        inventory: InventoryService::new(db.clone()),
        customers: CustomerService::new(db.clone()),
        orders: SalesOrderService::new(db.clone()),
        billing: BillingService::new(db.clone()),
        suppliers: SupplierService::new(db.clone()),
        purchasing: PurchaseOrderService::new(db.clone()),
        receiving: ReceivingService::new(db.clone()),
        db,
        actor: Uuid::new_v4(),
    }
}

impl TestContext {
    pub async fn seed_product(&self, sku: &str, unit_price: Decimal) -> ProductModel {
        self.catalog
            .create_product(CreateProductRequest {
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                description: None,
                category_id: None,
                unit_price,
                cost_price: unit_price,
                unit_of_measure: "unit".to_string(),
                min_stock_level: 0,
            })
            .await
            .expect("seed product")
    }

    pub async fn seed_customer(&self, email: &str) -> Uuid {
        self.customers
            .create_customer(CreateCustomerRequest {
                name: "Test Customer".to_string(),
                customer_type: CustomerType::Company,
                email: email.to_string(),
                phone: None,
                address: None,
                tax_id: None,
                credit_limit: Decimal::ZERO,
            })
            .await
            .expect("seed customer")
            .id
    }

    pub async fn seed_supplier(&self, email: &str) -> Uuid {
        self.suppliers
            .create_supplier(CreateSupplierRequest {
                name: "Test Supplier".to_string(),
                supplier_type: SupplierType::Distributor,
                email: email.to_string(),
                phone: None,
                address: None,
                tax_id: None,
                payment_terms: Some(30),
            })
            .await
            .expect("seed supplier")
            .id
    }
}
