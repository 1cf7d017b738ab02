//! Sea-ORM entities, one module per table.

pub mod category;
pub mod customer;
pub mod invoice;
pub mod payment;
pub mod product;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod purchase_receipt;
pub mod purchase_receipt_item;
pub mod sales_order;
pub mod sales_order_item;
pub mod stock;
pub mod stock_movement;
pub mod supplier;
