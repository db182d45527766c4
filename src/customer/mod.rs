//! Customer accounts and the admin endpoints for managing them.

mod core;
mod endpoints;

pub use core::{
    Customer, CustomerTransactionCount, CustomerUpdate, NewCustomer, Role, create_customer,
    create_customer_table, delete_customer, email_exists, get_all_customers, get_customer,
    get_customer_by_login, get_customers_with_transactions, get_transaction_counts,
    update_customer, validate_contact_details,
};
pub use endpoints::{
    create_customer_endpoint, delete_customer_endpoint, get_customer_endpoint,
    get_customers_endpoint, get_customers_with_transactions_endpoint,
    get_transaction_counts_endpoint, update_customer_endpoint,
};
