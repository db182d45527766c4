//! Admin endpoints for tracking stock.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::{InventoryCode, VehicleCode},
    inventory::{
        InventoryRecord, NewInventoryRecord, Restock, create_inventory_record,
        delete_inventory_record, get_all_inventory, get_inventory_by_vehicle,
        get_inventory_record, restock_vehicle,
    },
};

/// The state needed to manage inventory.
#[derive(Debug, Clone)]
pub struct InventoryState {
    /// The database connection for managing inventory.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for InventoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_inventory_endpoint(
    State(state): State<InventoryState>,
) -> Result<Json<Vec<InventoryRecord>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_inventory(&connection).map(Json)
}

pub async fn get_inventory_record_endpoint(
    State(state): State<InventoryState>,
    Path(inventory_code): Path<InventoryCode>,
) -> Result<Json<InventoryRecord>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_inventory_record(inventory_code, &connection).map(Json)
}

pub async fn get_vehicle_inventory_endpoint(
    State(state): State<InventoryState>,
    Path(vehicle_code): Path<VehicleCode>,
) -> Result<Json<InventoryRecord>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_inventory_by_vehicle(vehicle_code, &connection).map(Json)
}

pub async fn create_inventory_endpoint(
    State(state): State<InventoryState>,
    Json(record): Json<NewInventoryRecord>,
) -> Result<(StatusCode, Json<InventoryRecord>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let record = create_inventory_record(&record, &connection)?;

    tracing::info!(
        "Tracking {} units of vehicle {}",
        record.stock_quantity,
        record.vehicle_code
    );

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn restock_vehicle_endpoint(
    State(state): State<InventoryState>,
    Path(vehicle_code): Path<VehicleCode>,
    Json(restock): Json<Restock>,
) -> Result<Json<InventoryRecord>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let record = restock_vehicle(vehicle_code, &restock, &connection)?;

    tracing::info!(
        "Restocked vehicle {vehicle_code} to {} units",
        record.stock_quantity
    );

    Ok(Json(record))
}

/// A route handler for deleting an inventory record, responds with 204 No Content on success.
pub async fn delete_inventory_endpoint(
    State(state): State<InventoryState>,
    Path(inventory_code): Path<InventoryCode>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    match delete_inventory_record(inventory_code, &connection)? {
        0 => Err(Error::NotFound),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}
