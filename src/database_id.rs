//! Database ID type definitions.
//!
//! Every record is identified by an integer "code" assigned by SQLite.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

pub type CategoryCode = DatabaseId;
pub type VehicleCode = DatabaseId;
pub type InventoryCode = DatabaseId;
pub type ManufacturerCode = DatabaseId;
pub type CustomerCode = DatabaseId;
pub type EmployeeCode = DatabaseId;
pub type DepartmentCode = DatabaseId;
pub type MaintenanceCode = DatabaseId;
pub type TransactionCode = DatabaseId;
