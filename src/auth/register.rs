//! Self-service registration for new customers.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::{PasswordHash, ValidatedPassword},
    customer::{
        Customer, NewCustomer, Role, create_customer, email_exists, validate_contact_details,
    },
};

/// The state needed to register a customer.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for managing customers.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The details a visitor must provide to register.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

/// Create a customer account from a registration form.
///
/// Registered accounts always get the [Role::Customer] role.
///
/// # Errors
///
/// - [Error::Validation] if a field is blank or the email address is malformed.
/// - [Error::DuplicateEmail] if the email address is already registered.
/// - [Error::TooWeak] if the password is easy to guess.
pub async fn register_customer(
    State(state): State<RegistrationState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<Customer>), Error> {
    validate_contact_details(&form.name, &form.email, &form.phone)?;

    if form.password.is_empty() {
        return Err(Error::validation("password", "must not be empty"));
    }

    {
        let connection = lock_connection(&state.db_connection)?;

        if email_exists(form.email.trim(), &connection)? {
            return Err(Error::DuplicateEmail);
        }
    }

    let password = ValidatedPassword::new(
        &form.password,
        &[form.name.as_str(), form.email.as_str(), form.phone.as_str()],
    )?;
    let password = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let connection = lock_connection(&state.db_connection)?;
    let customer = create_customer(
        NewCustomer {
            name: form.name,
            email: form.email,
            password,
            phone: form.phone,
            role: Role::Customer,
        },
        &connection,
    )?;

    tracing::info!("Registered customer {}", customer.code);

    Ok((StatusCode::CREATED, Json(customer)))
}
