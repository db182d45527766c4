//! Admin endpoints for managing customer accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::PasswordHash,
    customer::{
        Customer, CustomerTransactionCount, CustomerUpdate, NewCustomer, Role, create_customer,
        delete_customer, get_all_customers, get_customer, get_customers_with_transactions,
        get_transaction_counts, update_customer, validate_contact_details,
    },
    database_id::CustomerCode,
};

/// The state needed to manage customers.
#[derive(Debug, Clone)]
pub struct CustomerState {
    /// The database connection for managing customers.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CustomerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data an admin sends to create an account.
///
/// Unlike self-registration, an admin may choose the role.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Customer
}

pub async fn get_customers_endpoint(
    State(state): State<CustomerState>,
) -> Result<Json<Vec<Customer>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_customers(&connection).map(Json)
}

pub async fn get_customer_endpoint(
    State(state): State<CustomerState>,
    Path(customer_code): Path<CustomerCode>,
) -> Result<Json<Customer>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_customer(customer_code, &connection).map(Json)
}

/// A route handler for creating a customer or admin account.
pub async fn create_customer_endpoint(
    State(state): State<CustomerState>,
    Json(form): Json<CustomerForm>,
) -> Result<(StatusCode, Json<Customer>), Error> {
    validate_contact_details(&form.name, &form.email, &form.phone)?;
    let password = PasswordHash::from_raw_password(&form.password, PasswordHash::DEFAULT_COST)?;

    let connection = lock_connection(&state.db_connection)?;
    let customer = create_customer(
        NewCustomer {
            name: form.name,
            email: form.email,
            password,
            phone: form.phone,
            role: form.role,
        },
        &connection,
    )?;

    tracing::info!(
        "Created {} account {}",
        customer.role.as_str(),
        customer.code
    );

    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer_endpoint(
    State(state): State<CustomerState>,
    Path(customer_code): Path<CustomerCode>,
    Json(update): Json<CustomerUpdate>,
) -> Result<Json<Customer>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_customer(customer_code, &update, &connection).map(Json)
}

/// A route handler for deleting a customer, responds with 204 No Content on success.
pub async fn delete_customer_endpoint(
    State(state): State<CustomerState>,
    Path(customer_code): Path<CustomerCode>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    match delete_customer(customer_code, &connection)? {
        0 => Err(Error::NotFound),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}

pub async fn get_customers_with_transactions_endpoint(
    State(state): State<CustomerState>,
) -> Result<Json<Vec<Customer>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_customers_with_transactions(&connection).map(Json)
}

pub async fn get_transaction_counts_endpoint(
    State(state): State<CustomerState>,
) -> Result<Json<Vec<CustomerTransactionCount>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction_counts(&connection).map(Json)
}
