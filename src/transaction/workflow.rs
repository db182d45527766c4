//! The sale workflow: the only way a transaction is recorded and stock goes down.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Entity, Error,
    customer::get_customer,
    database_id::{CustomerCode, DatabaseId, EmployeeCode, VehicleCode},
    employee::get_employee,
    inventory::decrement_stock,
    transaction::{
        Transaction,
        core::{NewTransaction, append_transaction, get_transaction, validate_price},
    },
    vehicle::get_vehicle,
};

/// A request to sell one unit of a vehicle to a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub vehicle_code: VehicleCode,
    pub customer_code: CustomerCode,
    /// The member of staff making the sale, if any. Checked when present.
    #[serde(default)]
    pub employee_code: Option<EmployeeCode>,
    pub price: f64,
    /// When the sale happened. Defaults to the time the sale is recorded.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub transaction_date: Option<OffsetDateTime>,
}

/// Turn a missing lookup into an error naming the missing reference.
fn resolve<T>(lookup: Result<T, Error>, entity: Entity, code: DatabaseId) -> Result<T, Error> {
    lookup.map_err(|error| match error {
        Error::NotFound => Error::ReferenceNotFound { entity, code },
        error => error,
    })
}

/// Sell one unit of a vehicle.
///
/// In a single database transaction this checks that the employee (if any),
/// customer and vehicle exist, records the sale with a copy of the customer's
/// contact details and the vehicle's name, then takes one unit out of stock.
/// If any step fails nothing is written.
///
/// # Errors
/// - [Error::Validation] if the price is not a positive amount.
/// - [Error::ReferenceNotFound] for the first of the employee, customer or
///   vehicle that does not exist.
/// - [Error::OutOfStock] if the vehicle has no units in stock.
/// - [Error::SqlError] if the database fails.
pub fn create_sale(request: &SaleRequest, connection: &Connection) -> Result<Transaction, Error> {
    validate_price(request.price)?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    if let Some(employee_code) = request.employee_code {
        resolve(
            get_employee(employee_code, &sql_transaction),
            Entity::Employee,
            employee_code,
        )?;
    }

    let customer = resolve(
        get_customer(request.customer_code, &sql_transaction),
        Entity::Customer,
        request.customer_code,
    )?;
    let vehicle = resolve(
        get_vehicle(request.vehicle_code, &sql_transaction),
        Entity::Vehicle,
        request.vehicle_code,
    )?;

    let transaction_code = append_transaction(
        &NewTransaction {
            vehicle_code: vehicle.code,
            customer_code: customer.code,
            employee_code: request.employee_code,
            transaction_date: request
                .transaction_date
                .unwrap_or_else(OffsetDateTime::now_utc),
            price: request.price,
            customer_name: customer.name,
            customer_email: customer.email,
            customer_phone: customer.phone,
            vehicle_name: vehicle.name,
        },
        &sql_transaction,
    )?;

    if let Err(error) = decrement_stock(vehicle.code, 1, &sql_transaction) {
        tracing::warn!(
            "Sale of vehicle {} to customer {} rolled back: {error}",
            vehicle.code,
            customer.code
        );
        return Err(error);
    }

    let transaction = get_transaction(transaction_code, &sql_transaction)?;
    sql_transaction.commit()?;

    tracing::info!(
        "Sold vehicle {} to customer {} for {:.2} (transaction {})",
        transaction.vehicle_code,
        transaction.customer_code,
        transaction.price,
        transaction.code
    );

    Ok(transaction)
}


#[cfg(test)]
mod concurrency_tests {
    use std::{
        path::Path,
        sync::{Arc, Barrier},
        thread,
    };

    use rusqlite::Connection;
    use tempfile::TempDir;

    use crate::{
        Error,
        customer::Role,
        db::{configure_connection, initialize, use_write_ahead_log},
        inventory::get_stock,
        test_utils::{insert_test_customer, insert_test_inventory, insert_test_vehicle},
        transaction::{SaleRequest, count_transactions, create_sale},
    };

    const SELLERS: usize = 8;

    fn open(path: &Path) -> Connection {
        let connection = Connection::open(path).expect("Could not open test database");
        configure_connection(&connection).expect("Could not configure test database");
        connection
    }

    #[test]
    fn only_one_of_many_concurrent_sales_gets_the_last_unit() {
        let temp_dir = TempDir::new().expect("Could not create temporary directory");
        let database_path = temp_dir.path().join("db.sqlite");
        let request = {
            let connection = open(&database_path);
            use_write_ahead_log(&connection).unwrap();
            initialize(&connection).unwrap();
            let vehicle = insert_test_vehicle(20_000.0, &connection);
            insert_test_inventory(vehicle.code, 1, &connection);
            let customer =
                insert_test_customer("Alice", "alice@example.com", Role::Customer, &connection);

            SaleRequest {
                vehicle_code: vehicle.code,
                customer_code: customer.code,
                employee_code: None,
                price: 20_000.0,
                transaction_date: None,
            }
        };
        let barrier = Arc::new(Barrier::new(SELLERS));

        let results: Vec<Result<_, Error>> = (0..SELLERS)
            .map(|_| {
                let connection = open(&database_path);
                let request = request.clone();
                let barrier = barrier.clone();

                thread::spawn(move || {
                    barrier.wait();
                    create_sale(&request, &connection)
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().expect("Seller thread panicked"))
            .collect();

        let successes = results.iter().filter(|result| result.is_ok()).count();
        let out_of_stock = results
            .iter()
            .filter(|result| matches!(result, Err(Error::OutOfStock { .. })))
            .count();

        assert_eq!(successes, 1, "got {results:?}");
        assert_eq!(out_of_stock, SELLERS - 1, "got {results:?}");

        let connection = open(&database_path);
        assert_eq!(get_stock(request.vehicle_code, &connection), Ok(0));
        assert_eq!(count_transactions(&connection), Ok(1));
    }
}
