use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Entity, Error,
    database_id::{InventoryCode, ManufacturerCode, VehicleCode},
    vehicle::get_vehicle,
};

/// How many units of a vehicle the dealership has in stock.
///
/// Each vehicle has at most one inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub code: InventoryCode,
    pub vehicle_code: VehicleCode,
    pub manufacturer_code: ManufacturerCode,
    pub stock_quantity: u32,
}

/// The data needed to start tracking stock for a vehicle.
///
/// The quantity is signed so that a negative value is reported as a
/// validation error rather than a malformed request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInventoryRecord {
    pub vehicle_code: VehicleCode,
    pub manufacturer_code: ManufacturerCode,
    pub stock_quantity: i64,
}

/// A delivery of new stock for a vehicle.
#[derive(Debug, Clone, Deserialize)]
pub struct Restock {
    pub manufacturer_code: ManufacturerCode,
    /// The new total stock quantity, which may not be lower than the current quantity.
    pub stock_quantity: i64,
}

pub fn create_inventory_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS inventory (
            code INTEGER PRIMARY KEY,
            vehicle_code INTEGER NOT NULL UNIQUE,
            manufacturer_code INTEGER NOT NULL,
            stock_quantity INTEGER NOT NULL CHECK (stock_quantity >= 0),
            FOREIGN KEY(vehicle_code) REFERENCES vehicle(code) ON DELETE RESTRICT
        )",
        (),
    )?;

    Ok(())
}

const INVENTORY_COLUMNS: &str = "code, vehicle_code, manufacturer_code, stock_quantity";

pub fn map_inventory_row(row: &rusqlite::Row) -> Result<InventoryRecord, rusqlite::Error> {
    Ok(InventoryRecord {
        code: row.get(0)?,
        vehicle_code: row.get(1)?,
        manufacturer_code: row.get(2)?,
        stock_quantity: row.get(3)?,
    })
}

fn validate_stock_quantity(stock_quantity: i64) -> Result<u32, Error> {
    u32::try_from(stock_quantity)
        .map_err(|_| Error::validation("stock_quantity", "must be a non-negative whole number"))
}

/// Start tracking stock for a vehicle.
///
/// # Errors
/// - [Error::Validation] if the quantity is negative or the vehicle already has a record.
/// - [Error::ReferenceNotFound] if the vehicle does not exist.
pub fn create_inventory_record(
    record: &NewInventoryRecord,
    connection: &Connection,
) -> Result<InventoryRecord, Error> {
    let stock_quantity = validate_stock_quantity(record.stock_quantity)?;

    match get_vehicle(record.vehicle_code, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => {
            return Err(Error::ReferenceNotFound {
                entity: Entity::Vehicle,
                code: record.vehicle_code,
            });
        }
        Err(error) => return Err(error),
    }

    connection
        .prepare(&format!(
            "INSERT INTO inventory (vehicle_code, manufacturer_code, stock_quantity)
            VALUES (?1, ?2, ?3)
            RETURNING {INVENTORY_COLUMNS}"
        ))?
        .query_row(
            (record.vehicle_code, record.manufacturer_code, stock_quantity),
            map_inventory_row,
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::validation("vehicle_code", "the vehicle already has an inventory record")
            }
            error => error.into(),
        })
}

pub fn get_inventory_record(
    code: InventoryCode,
    connection: &Connection,
) -> Result<InventoryRecord, Error> {
    connection
        .prepare(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE code = :code"
        ))?
        .query_row(&[(":code", &code)], map_inventory_row)
        .map_err(|error| error.into())
}

pub fn get_inventory_by_vehicle(
    vehicle_code: VehicleCode,
    connection: &Connection,
) -> Result<InventoryRecord, Error> {
    connection
        .prepare(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE vehicle_code = :vehicle_code"
        ))?
        .query_row(&[(":vehicle_code", &vehicle_code)], map_inventory_row)
        .map_err(|error| error.into())
}

pub fn get_all_inventory(connection: &Connection) -> Result<Vec<InventoryRecord>, Error> {
    connection
        .prepare(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory ORDER BY code"
        ))?
        .query_map([], map_inventory_row)?
        .map(|maybe_record| maybe_record.map_err(Error::from))
        .collect()
}

/// Get the number of units of a vehicle in stock.
///
/// # Errors
/// Returns [Error::NotFound] if the vehicle has no inventory record.
pub fn get_stock(vehicle_code: VehicleCode, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT stock_quantity FROM inventory WHERE vehicle_code = ?1",
            [vehicle_code],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Take `amount` units of a vehicle out of stock.
///
/// The check and the decrement are a single conditional update, so two
/// connections can never both take the last unit.
/// Only the sale workflow may call this.
///
/// # Errors
/// Returns [Error::OutOfStock] if the vehicle has no inventory record or fewer
/// than `amount` units in stock, in which case the stock is left unchanged.
pub(crate) fn decrement_stock(
    vehicle_code: VehicleCode,
    amount: u32,
    connection: &Connection,
) -> Result<(), Error> {
    if amount == 0 {
        return Err(Error::validation("amount", "must be at least one"));
    }

    let rows_affected = connection.execute(
        "UPDATE inventory SET stock_quantity = stock_quantity - ?2
        WHERE vehicle_code = ?1 AND stock_quantity >= ?2",
        (vehicle_code, amount),
    )?;

    if rows_affected == 0 {
        return Err(Error::OutOfStock { vehicle_code });
    }

    Ok(())
}

/// Record a delivery of stock for a vehicle.
///
/// Stock only goes down through sales, so the new quantity may not be below
/// the current one. The comparison happens in the update itself, so a sale
/// committed on another connection is never overwritten.
///
/// # Errors
/// - [Error::NotFound] if the vehicle has no inventory record.
/// - [Error::Validation] if the quantity is negative or lower than the current stock.
pub fn restock_vehicle(
    vehicle_code: VehicleCode,
    restock: &Restock,
    connection: &Connection,
) -> Result<InventoryRecord, Error> {
    let stock_quantity = validate_stock_quantity(restock.stock_quantity)?;

    let updated = connection
        .prepare(&format!(
            "UPDATE inventory SET manufacturer_code = ?1, stock_quantity = ?2
            WHERE vehicle_code = ?3 AND stock_quantity <= ?2
            RETURNING {INVENTORY_COLUMNS}"
        ))?
        .query_row(
            (restock.manufacturer_code, stock_quantity, vehicle_code),
            map_inventory_row,
        );

    match updated {
        Ok(record) => Ok(record),
        // Either there is no record or the new quantity is below the current stock.
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            let current_stock = get_stock(vehicle_code, connection)?;

            Err(Error::validation(
                "stock_quantity",
                format!("cannot be lower than the current stock of {current_stock}"),
            ))
        }
        Err(error) => Err(error.into()),
    }
}

type RowsAffected = usize;

pub fn delete_inventory_record(
    code: InventoryCode,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute("DELETE FROM inventory WHERE code = :code", &[(":code", &code)])
        .map_err(|error| error.into())
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_inventory_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_inventory_table(&connection));
    }
}
