use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, app_state::lock_connection, database_id::TransactionCode,
    transaction::delete_transaction,
};

/// The state needed to delete a sale.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a sale, responds with 204 No Content on success.
///
/// The vehicle is not put back into stock.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_code): Path<TransactionCode>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    match delete_transaction(transaction_code, &connection)? {
        0 => Err(Error::NotFound),
        _ => {
            tracing::info!("Deleted transaction {transaction_code}");
            Ok(StatusCode::NO_CONTENT)
        }
    }
}
