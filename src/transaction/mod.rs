//! Sales records and the workflow that creates them.
//!
//! This module contains everything related to sales:
//! - The `Transaction` model and the database functions for the transaction log
//! - The sale workflow, which records a sale and takes the vehicle out of stock
//!   in one database transaction
//! - Route handlers for customer purchases, staff sales and sales records

mod core;
mod delete_endpoint;
mod edit_endpoint;
mod purchase_endpoint;
mod sale_endpoint;
mod view_endpoints;
mod workflow;

pub use core::{
    Transaction, TransactionTotal, TransactionUpdate, count_transactions,
    create_transaction_table, delete_transaction, get_all_transactions, get_transaction,
    update_transaction,
};
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use purchase_endpoint::create_purchase_endpoint;
pub use sale_endpoint::create_sale_endpoint;
pub use view_endpoints::{
    get_transaction_endpoint, get_transaction_total_endpoint, get_transactions_endpoint,
};
pub use workflow::{SaleRequest, create_sale};
