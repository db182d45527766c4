use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::TransactionCode,
    transaction::{Transaction, TransactionUpdate, update_transaction},
};

/// The state needed to correct a sale.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for correcting the price, date or employee of a sale.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_code): Path<TransactionCode>,
    Json(update): Json<TransactionUpdate>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transaction = update_transaction(transaction_code, &update, &connection)?;

    tracing::info!("Updated transaction {transaction_code}");

    Ok(Json(transaction))
}
