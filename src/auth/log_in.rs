//! Handles log-in requests.
//! The cookie module handles the lower level cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::set_auth_cookie,
    customer::{Role, get_customer_by_login},
    database_id::CustomerCode,
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up customers.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent with a log-in request.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The customer's email address or name.
    pub login: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Who was logged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The code of the logged in customer.
    pub code: CustomerCode,
    /// The role granted to the session.
    pub role: Role,
}

/// Handler for log-in requests via the POST method.
///
/// On success the auth cookie is set and the customer's code and role are returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - No customer has the email address or name given as the login.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Json(user_data): Json<LogInData>,
) -> Result<(PrivateCookieJar, Json<LogInResponse>), Error> {
    let customer = {
        let connection = lock_connection(&state.db_connection)?;

        match get_customer_by_login(user_data.login.trim(), &connection) {
            Ok(customer) => customer,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    if !customer.password.verify(&user_data.password)? {
        tracing::info!("Failed log-in attempt for customer {}", customer.code);
        return Err(Error::InvalidCredentials);
    }

    let jar = set_auth_cookie(jar, customer.code, customer.role, state.cookie_duration)?;
    tracing::info!("Customer {} logged in", customer.code);

    Ok((
        jar,
        Json(LogInResponse {
            code: customer.code,
            role: customer.role,
        }),
    ))
}
