//! Domain services. Each service owns one area of the data model, holds a
//! shared database handle, and keeps every multi-row write inside a single
//! transaction.

pub mod billing;
pub mod customers;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod purchasing;
pub mod receiving;
pub mod suppliers;

pub use billing::BillingService;
pub use customers::CustomerService;
pub use inventory::InventoryService;
pub use orders::SalesOrderService;
pub use products::CatalogService;
pub use purchasing::PurchaseOrderService;
pub use receiving::ReceivingService;
pub use suppliers::SupplierService;
