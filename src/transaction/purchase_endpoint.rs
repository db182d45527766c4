use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::Token,
    database_id::VehicleCode,
    transaction::{SaleRequest, Transaction, create_sale},
};

/// The state needed for customers to buy vehicles.
#[derive(Debug, Clone)]
pub struct PurchaseState {
    /// The database connection for recording sales.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PurchaseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body a customer sends to buy a vehicle.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseForm {
    pub vehicle_code: VehicleCode,
    pub price: f64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub transaction_date: Option<OffsetDateTime>,
}

/// A route handler for the logged in customer buying a vehicle.
///
/// The buyer is always the customer in the session and no employee is recorded.
pub async fn create_purchase_endpoint(
    State(state): State<PurchaseState>,
    Extension(token): Extension<Token>,
    Json(form): Json<PurchaseForm>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let request = SaleRequest {
        vehicle_code: form.vehicle_code,
        customer_code: token.customer_code,
        employee_code: None,
        price: form.price,
        transaction_date: form.transaction_date,
    };

    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_sale(&request, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        build_router,
        customer::Role,
        endpoints,
        inventory::get_stock,
        test_utils::{
            get_test_server_as, get_test_state, insert_test_inventory, insert_test_vehicle,
        },
        transaction::{Transaction, count_transactions},
    };

    #[tokio::test]
    async fn customer_buys_vehicle_for_themselves() {
        let (server, state) = get_test_server_as(Role::Customer).await;
        let vehicle = {
            let connection = state.db_connection.lock().unwrap();
            let vehicle = insert_test_vehicle(20_000.0, &connection);
            insert_test_inventory(vehicle.code, 2, &connection);
            vehicle
        };

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({ "vehicle_code": vehicle.code, "price": 20000.0 }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let transaction = response.json::<Transaction>();
        assert_eq!(transaction.customer_name, "Test User");
        assert_eq!(transaction.employee_code, None);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_stock(vehicle.code, &connection), Ok(1));
    }

    #[tokio::test]
    async fn purchase_of_sold_out_vehicle_is_conflict() {
        let (server, state) = get_test_server_as(Role::Customer).await;
        let vehicle = {
            let connection = state.db_connection.lock().unwrap();
            let vehicle = insert_test_vehicle(20_000.0, &connection);
            insert_test_inventory(vehicle.code, 0, &connection);
            vehicle
        };

        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({ "vehicle_code": vehicle.code, "price": 20000.0 }))
            .await
            .assert_status(StatusCode::CONFLICT);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[tokio::test]
    async fn visitors_cannot_buy() {
        let server = TestServer::try_new(build_router(get_test_state()))
            .expect("Could not create test server.");

        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({ "vehicle_code": 1, "price": 20000.0 }))
            .await
            .assert_status_unauthorized();
    }
}
