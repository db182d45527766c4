//! Stock levels for each vehicle.
//!
//! Stock goes up through restocking and only goes down through the sale workflow.

mod core;
mod endpoints;

pub use core::{
    InventoryRecord, NewInventoryRecord, Restock, create_inventory_record, create_inventory_table,
    delete_inventory_record, get_all_inventory, get_inventory_by_vehicle, get_inventory_record,
    get_stock, restock_vehicle,
};
pub(crate) use core::decrement_stock;
pub use endpoints::{
    create_inventory_endpoint, delete_inventory_endpoint, get_inventory_endpoint,
    get_inventory_record_endpoint, get_vehicle_inventory_endpoint, restock_vehicle_endpoint,
};
