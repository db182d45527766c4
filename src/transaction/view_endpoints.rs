//! Route handlers for reading sales records.
//!
//! Customers may read their own sales. Reading someone else's sale looks the
//! same as reading one that does not exist.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::Token,
    database_id::TransactionCode,
    transaction::{Transaction, TransactionTotal, get_all_transactions, get_transaction},
};

/// The state needed to read sales.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for reading sales.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn get_visible_transaction(
    code: TransactionCode,
    token: &Token,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(code, connection)?;

    if token.is_admin() || token.is_owner(transaction.customer_code) {
        Ok(transaction)
    } else {
        Err(Error::NotFound)
    }
}

pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_transactions(&connection).map(Json)
}

pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(token): Extension<Token>,
    Path(transaction_code): Path<TransactionCode>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_visible_transaction(transaction_code, &token, &connection).map(Json)
}

pub async fn get_transaction_total_endpoint(
    State(state): State<TransactionState>,
    Extension(token): Extension<Token>,
    Path(transaction_code): Path<TransactionCode>,
) -> Result<Json<TransactionTotal>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transaction = get_visible_transaction(transaction_code, &token, &connection)?;

    Ok(Json(TransactionTotal {
        code: transaction.code,
        total: transaction.price,
    }))
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        customer::Role,
        endpoints::{self, format_endpoint},
        test_utils::{
            get_test_server_as, insert_test_inventory, insert_test_sale, insert_test_vehicle,
        },
        transaction::{SaleRequest, Transaction, TransactionTotal, create_sale},
    };

    #[tokio::test]
    async fn customers_cannot_list_all_sales() {
        let (server, _) = get_test_server_as(Role::Customer).await;

        server
            .get(endpoints::TRANSACTIONS)
            .await
            .assert_status_forbidden();
    }

    #[tokio::test]
    async fn admin_lists_all_sales() {
        let (server, state) = get_test_server_as(Role::Admin).await;
        let sale = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_sale(&connection)
        };

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Transaction>>(), vec![sale]);
    }

    #[tokio::test]
    async fn customer_reads_own_sale_and_total() {
        let (server, state) = get_test_server_as(Role::Customer).await;
        let sale = {
            let connection = state.db_connection.lock().unwrap();
            let vehicle = insert_test_vehicle(20_000.0, &connection);
            insert_test_inventory(vehicle.code, 1, &connection);
            create_sale(
                &SaleRequest {
                    vehicle_code: vehicle.code,
                    // The logged in test user is the first customer.
                    customer_code: 1,
                    employee_code: None,
                    price: 19_999.0,
                    transaction_date: Some(datetime!(2025-02-01 08:00 UTC)),
                },
                &connection,
            )
            .unwrap()
        };

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, sale.code))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Transaction>(), sale);

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION_TOTAL, sale.code))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<TransactionTotal>(),
            TransactionTotal {
                code: sale.code,
                total: 19_999.0
            }
        );
    }

    #[tokio::test]
    async fn someone_elses_sale_is_not_found() {
        let (server, state) = get_test_server_as(Role::Customer).await;
        let sale = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_sale(&connection)
        };

        server
            .get(&format_endpoint(endpoints::TRANSACTION, sale.code))
            .await
            .assert_status_not_found();
        server
            .get(&format_endpoint(endpoints::TRANSACTION_TOTAL, sale.code))
            .await
            .assert_status_not_found();
    }
}
