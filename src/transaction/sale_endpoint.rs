use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    transaction::{SaleRequest, Transaction, create_sale},
};

/// The state needed for staff to record sales.
#[derive(Debug, Clone)]
pub struct SaleState {
    /// The database connection for recording sales.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SaleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for staff selling a vehicle to a customer.
///
/// Unlike a customer's own purchase, a staff sale must name the employee.
pub async fn create_sale_endpoint(
    State(state): State<SaleState>,
    Json(request): Json<SaleRequest>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    if request.employee_code.is_none() {
        return Err(Error::validation("employee_code", "required"));
    }

    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_sale(&request, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
