//! Route handlers for browsing and managing vehicles.
//!
//! The listing endpoints are public and only show visible vehicles.
//! Everything that changes a vehicle is for admins.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::VehicleCode,
    vehicle::{
        Vehicle, VehicleForm, VehicleListing, VehiclePatch, create_vehicle, delete_vehicle,
        get_premium_vehicles, get_vehicle, get_vehicles_by_price, get_visible_vehicles,
        hide_vehicle, patch_vehicle, update_vehicle,
    },
};

/// The state needed to get or manage vehicles.
#[derive(Debug, Clone)]
pub struct VehicleState {
    /// The database connection for managing vehicles.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for VehicleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of the vehicle listing endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleList {
    pub data: Vec<VehicleListing>,
}

/// The optional price bounds for [get_vehicles_by_price_endpoint].
#[derive(Debug, Deserialize, Serialize)]
pub struct PriceRange {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

pub async fn get_vehicles_endpoint(
    State(state): State<VehicleState>,
) -> Result<Json<VehicleList>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let data = get_visible_vehicles(&connection)?;

    Ok(Json(VehicleList { data }))
}

pub async fn get_vehicles_by_price_endpoint(
    State(state): State<VehicleState>,
    Query(range): Query<PriceRange>,
) -> Result<Json<VehicleList>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let data = get_vehicles_by_price(range.min_price, range.max_price, &connection)?;

    Ok(Json(VehicleList { data }))
}

pub async fn get_premium_vehicles_endpoint(
    State(state): State<VehicleState>,
) -> Result<Json<VehicleList>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let data = get_premium_vehicles(&connection)?;

    Ok(Json(VehicleList { data }))
}

/// Get a single vehicle.
///
/// Hidden vehicles are reported as not found so they cannot be found by guessing codes.
pub async fn get_vehicle_endpoint(
    State(state): State<VehicleState>,
    Path(vehicle_code): Path<VehicleCode>,
) -> Result<Json<Vehicle>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let vehicle = get_vehicle(vehicle_code, &connection)?;

    if !vehicle.is_visible {
        return Err(Error::NotFound);
    }

    Ok(Json(vehicle))
}

pub async fn create_vehicle_endpoint(
    State(state): State<VehicleState>,
    Json(form): Json<VehicleForm>,
) -> Result<(StatusCode, Json<Vehicle>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let vehicle = create_vehicle(&form, &connection)?;

    tracing::info!("Created vehicle {} \"{}\"", vehicle.code, vehicle.name);

    Ok((StatusCode::CREATED, Json(vehicle)))
}

pub async fn update_vehicle_endpoint(
    State(state): State<VehicleState>,
    Path(vehicle_code): Path<VehicleCode>,
    Json(form): Json<VehicleForm>,
) -> Result<Json<Vehicle>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_vehicle(vehicle_code, &form, &connection).map(Json)
}

/// Change some fields of a vehicle. Unknown fields are rejected.
pub async fn patch_vehicle_endpoint(
    State(state): State<VehicleState>,
    Path(vehicle_code): Path<VehicleCode>,
    Json(patch): Json<VehiclePatch>,
) -> Result<Json<Vehicle>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    patch_vehicle(vehicle_code, patch, &connection).map(Json)
}

pub async fn hide_vehicle_endpoint(
    State(state): State<VehicleState>,
    Path(vehicle_code): Path<VehicleCode>,
) -> Result<Json<Vehicle>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    hide_vehicle(vehicle_code, &connection).map(Json)
}

/// A route handler for deleting a vehicle and its inventory, responds with 204 No Content on success.
pub async fn delete_vehicle_endpoint(
    State(state): State<VehicleState>,
    Path(vehicle_code): Path<VehicleCode>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_vehicle(vehicle_code, &connection)?;

    tracing::info!("Deleted vehicle {vehicle_code}");

    Ok(StatusCode::NO_CONTENT)
}
