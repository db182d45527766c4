//! Service history for vehicles.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Entity, Error,
    app_state::lock_connection,
    database_id::{MaintenanceCode, VehicleCode},
    vehicle::get_vehicle,
};

/// The longest maintenance description accepted.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// A service performed on a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintenance {
    pub code: MaintenanceCode,
    pub vehicle_code: VehicleCode,
    #[serde(with = "time::serde::rfc3339")]
    pub maintenance_date: OffsetDateTime,
    pub description: String,
    pub cost: f64,
}

/// The request body for recording or correcting a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceForm {
    pub vehicle_code: VehicleCode,
    #[serde(with = "time::serde::rfc3339")]
    pub maintenance_date: OffsetDateTime,
    pub description: String,
    pub cost: f64,
}

pub fn create_maintenance_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS maintenance (
            code INTEGER PRIMARY KEY,
            vehicle_code INTEGER NOT NULL,
            maintenance_date TEXT NOT NULL,
            description TEXT NOT NULL,
            cost REAL NOT NULL CHECK (cost > 0),
            FOREIGN KEY(vehicle_code) REFERENCES vehicle(code) ON DELETE RESTRICT
        )",
        (),
    )?;

    Ok(())
}

const MAINTENANCE_COLUMNS: &str = "code, vehicle_code, maintenance_date, description, cost";

fn map_maintenance_row(row: &rusqlite::Row) -> Result<Maintenance, rusqlite::Error> {
    Ok(Maintenance {
        code: row.get(0)?,
        vehicle_code: row.get(1)?,
        maintenance_date: row.get(2)?,
        description: row.get(3)?,
        cost: row.get(4)?,
    })
}

fn validate_maintenance(form: &MaintenanceForm, connection: &Connection) -> Result<(), Error> {
    let description = form.description.trim();

    if description.is_empty() {
        return Err(Error::validation("description", "must not be empty"));
    }

    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(Error::validation(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        ));
    }

    if !form.cost.is_finite() || form.cost <= 0.0 {
        return Err(Error::validation("cost", "must be greater than zero"));
    }

    match get_vehicle(form.vehicle_code, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::ReferenceNotFound {
            entity: Entity::Vehicle,
            code: form.vehicle_code,
        }),
        Err(error) => Err(error),
    }
}

/// Record a service.
///
/// # Errors
/// - [Error::Validation] if the description is blank or too long, or the cost is not positive.
/// - [Error::ReferenceNotFound] if the vehicle does not exist.
pub fn create_maintenance(
    form: &MaintenanceForm,
    connection: &Connection,
) -> Result<Maintenance, Error> {
    validate_maintenance(form, connection)?;

    connection
        .prepare(&format!(
            "INSERT INTO maintenance (vehicle_code, maintenance_date, description, cost)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {MAINTENANCE_COLUMNS}"
        ))?
        .query_row(
            (
                form.vehicle_code,
                form.maintenance_date,
                form.description.trim(),
                form.cost,
            ),
            map_maintenance_row,
        )
        .map_err(|error| error.into())
}

pub fn get_maintenance(
    code: MaintenanceCode,
    connection: &Connection,
) -> Result<Maintenance, Error> {
    connection
        .prepare(&format!(
            "SELECT {MAINTENANCE_COLUMNS} FROM maintenance WHERE code = :code"
        ))?
        .query_row(&[(":code", &code)], map_maintenance_row)
        .map_err(|error| error.into())
}

pub fn get_all_maintenance(connection: &Connection) -> Result<Vec<Maintenance>, Error> {
    connection
        .prepare(&format!(
            "SELECT {MAINTENANCE_COLUMNS} FROM maintenance ORDER BY maintenance_date, code"
        ))?
        .query_map([], map_maintenance_row)?
        .map(|maybe_maintenance| maybe_maintenance.map_err(Error::from))
        .collect()
}

/// Replace every field of a service record.
///
/// # Errors
/// Returns [Error::NotFound] if no record has the code, otherwise the same
/// errors as [create_maintenance].
pub fn update_maintenance(
    code: MaintenanceCode,
    form: &MaintenanceForm,
    connection: &Connection,
) -> Result<Maintenance, Error> {
    validate_maintenance(form, connection)?;

    connection
        .prepare(&format!(
            "UPDATE maintenance
            SET vehicle_code = ?1, maintenance_date = ?2, description = ?3, cost = ?4
            WHERE code = ?5
            RETURNING {MAINTENANCE_COLUMNS}"
        ))?
        .query_row(
            (
                form.vehicle_code,
                form.maintenance_date,
                form.description.trim(),
                form.cost,
                code,
            ),
            map_maintenance_row,
        )
        .map_err(|error| error.into())
}

type RowsAffected = usize;

pub fn delete_maintenance(
    code: MaintenanceCode,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM maintenance WHERE code = :code",
            &[(":code", &code)],
        )
        .map_err(|error| error.into())
}

/// The state needed to manage service records.
#[derive(Debug, Clone)]
pub struct MaintenanceState {
    /// The database connection for managing service records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MaintenanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_maintenance_list_endpoint(
    State(state): State<MaintenanceState>,
) -> Result<Json<Vec<Maintenance>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_maintenance(&connection).map(Json)
}

pub async fn get_maintenance_endpoint(
    State(state): State<MaintenanceState>,
    Path(maintenance_code): Path<MaintenanceCode>,
) -> Result<Json<Maintenance>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_maintenance(maintenance_code, &connection).map(Json)
}

pub async fn create_maintenance_endpoint(
    State(state): State<MaintenanceState>,
    Json(form): Json<MaintenanceForm>,
) -> Result<(StatusCode, Json<Maintenance>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let maintenance = create_maintenance(&form, &connection)?;

    tracing::info!(
        "Recorded maintenance {} for vehicle {}",
        maintenance.code,
        maintenance.vehicle_code
    );

    Ok((StatusCode::CREATED, Json(maintenance)))
}

pub async fn update_maintenance_endpoint(
    State(state): State<MaintenanceState>,
    Path(maintenance_code): Path<MaintenanceCode>,
    Json(form): Json<MaintenanceForm>,
) -> Result<Json<Maintenance>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_maintenance(maintenance_code, &form, &connection).map(Json)
}

/// A route handler for deleting a service record, responds with 204 No Content on success.
pub async fn delete_maintenance_endpoint(
    State(state): State<MaintenanceState>,
    Path(maintenance_code): Path<MaintenanceCode>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    match delete_maintenance(maintenance_code, &connection)? {
        0 => Err(Error::NotFound),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_maintenance_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_maintenance_table(&connection));
    }
}
