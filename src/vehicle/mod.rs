//! Vehicles for sale, their validation rules and the listing and admin endpoints.

mod core;
mod endpoints;

pub use core::{
    Vehicle, VehicleForm, VehicleListing, VehiclePatch, create_vehicle, create_vehicle_table,
    delete_vehicle, get_premium_vehicles, get_vehicle, get_vehicles_by_price, get_visible_vehicles,
    hide_vehicle, patch_vehicle, update_vehicle,
};
pub use endpoints::{
    create_vehicle_endpoint, delete_vehicle_endpoint, get_premium_vehicles_endpoint,
    get_vehicle_endpoint, get_vehicles_by_price_endpoint, get_vehicles_endpoint,
    hide_vehicle_endpoint, patch_vehicle_endpoint, update_vehicle_endpoint,
};
