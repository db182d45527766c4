//! Defines the core data models and database queries for sales records.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Entity, Error,
    database_id::{CustomerCode, EmployeeCode, TransactionCode, VehicleCode},
    employee::get_employee,
};

// ============================================================================
// MODELS
// ============================================================================

/// The record of a vehicle being sold to a customer.
///
/// The customer's contact details and the vehicle's name are copied when the
/// sale is made, so the record still reads correctly after either changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub code: TransactionCode,
    pub vehicle_code: VehicleCode,
    pub customer_code: CustomerCode,
    /// The member of staff who made the sale, if any.
    ///
    /// Purchases customers make themselves have no employee.
    pub employee_code: Option<EmployeeCode>,
    #[serde(with = "time::serde::rfc3339")]
    pub transaction_date: OffsetDateTime,
    pub price: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub vehicle_name: String,
}

/// A sale that has not been written to the database yet.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewTransaction {
    pub vehicle_code: VehicleCode,
    pub customer_code: CustomerCode,
    pub employee_code: Option<EmployeeCode>,
    pub transaction_date: OffsetDateTime,
    pub price: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub vehicle_name: String,
}

/// The fields of a sale that may be corrected after it is made.
///
/// The vehicle and customer of a sale are fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub transaction_date: OffsetDateTime,
    #[serde(default)]
    pub employee_code: Option<EmployeeCode>,
}

/// The amount paid in a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTotal {
    pub code: TransactionCode,
    pub total: f64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            code INTEGER PRIMARY KEY,
            vehicle_code INTEGER NOT NULL,
            customer_code INTEGER NOT NULL,
            employee_code INTEGER,
            transaction_date TEXT NOT NULL,
            price REAL NOT NULL CHECK (price > 0),
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            customer_phone TEXT NOT NULL,
            vehicle_name TEXT NOT NULL,
            FOREIGN KEY(vehicle_code) REFERENCES vehicle(code) ON DELETE RESTRICT,
            FOREIGN KEY(customer_code) REFERENCES customer(code) ON DELETE RESTRICT,
            FOREIGN KEY(employee_code) REFERENCES employee(code) ON DELETE RESTRICT
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_customer
        ON \"transaction\"(customer_code)",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "code, vehicle_code, customer_code, employee_code, \
    transaction_date, price, customer_name, customer_email, customer_phone, vehicle_name";

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        code: row.get(0)?,
        vehicle_code: row.get(1)?,
        customer_code: row.get(2)?,
        employee_code: row.get(3)?,
        transaction_date: row.get(4)?,
        price: row.get(5)?,
        customer_name: row.get(6)?,
        customer_email: row.get(7)?,
        customer_phone: row.get(8)?,
        vehicle_name: row.get(9)?,
    })
}

/// Check that a sale price is a positive, finite amount.
pub(crate) fn validate_price(price: f64) -> Result<(), Error> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::validation("price", "must be greater than zero"));
    }

    Ok(())
}

/// Write a sale to the transaction log.
///
/// Only the sale workflow calls this, inside the same database transaction
/// that takes the vehicle out of stock.
pub(crate) fn append_transaction(
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<TransactionCode, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (
                vehicle_code, customer_code, employee_code, transaction_date, price,
                customer_name, customer_email, customer_phone, vehicle_name
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING code",
        )?
        .query_row(
            (
                transaction.vehicle_code,
                transaction.customer_code,
                transaction.employee_code,
                transaction.transaction_date,
                transaction.price,
                &transaction.customer_name,
                &transaction.customer_email,
                &transaction.customer_phone,
                &transaction.vehicle_name,
            ),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Retrieve a sale by its code.
///
/// # Errors
/// Returns [Error::NotFound] if no sale has the code.
pub fn get_transaction(code: TransactionCode, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE code = :code"
        ))?
        .query_row(&[(":code", &code)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve every sale, most recent first.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
            ORDER BY transaction_date DESC, code DESC"
        ))?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Count the sales in the transaction log.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    let count: i64 =
        connection.query_row("SELECT COUNT(code) FROM \"transaction\"", [], |row| row.get(0))?;

    // COUNT never returns a negative number.
    Ok(count.unsigned_abs())
}

/// Correct the price, date or employee of a sale.
///
/// # Errors
/// - [Error::Validation] if the price is not positive.
/// - [Error::ReferenceNotFound] if the new employee does not exist.
/// - [Error::NotFound] if no sale has the code.
pub fn update_transaction(
    code: TransactionCode,
    update: &TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_price(update.price)?;

    if let Some(employee_code) = update.employee_code {
        match get_employee(employee_code, connection) {
            Ok(_) => {}
            Err(Error::NotFound) => {
                return Err(Error::ReferenceNotFound {
                    entity: Entity::Employee,
                    code: employee_code,
                });
            }
            Err(error) => return Err(error),
        }
    }

    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
            SET price = ?1, transaction_date = ?2, employee_code = ?3
            WHERE code = ?4
            RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                update.price,
                update.transaction_date,
                update.employee_code,
                code,
            ),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

type RowsAffected = usize;

/// Delete a sale from the log.
///
/// The vehicle is not put back into stock.
pub fn delete_transaction(
    code: TransactionCode,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE code = :code",
            &[(":code", &code)],
        )
        .map_err(|error| error.into())
}
