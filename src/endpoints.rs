//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/vehicles/{vehicle_code}', use [format_endpoint].

/// The route for creating a customer account.
pub const REGISTER: &str = "/api/register";
/// The route for logging in.
pub const LOG_IN: &str = "/api/log_in";
/// The route for logging out.
pub const LOG_OUT: &str = "/api/log_out";

/// The route for listing and creating vehicle categories.
pub const CATEGORIES: &str = "/api/categories";

/// The route for listing and creating vehicles.
pub const VEHICLES: &str = "/api/vehicles";
/// The route for listing vehicles within a price range.
pub const VEHICLES_BY_PRICE: &str = "/api/vehicles/by_price";
/// The route for listing premium vehicles.
pub const PREMIUM_VEHICLES: &str = "/api/vehicles/premium";
/// The route to access a single vehicle.
pub const VEHICLE: &str = "/api/vehicles/{vehicle_code}";
/// The route for removing a vehicle from the public listings.
pub const HIDE_VEHICLE: &str = "/api/vehicles/{vehicle_code}/hide";

/// The route for listing and creating inventory records.
pub const INVENTORY: &str = "/api/inventory";
/// The route to access a single inventory record.
pub const INVENTORY_RECORD: &str = "/api/inventory/{inventory_code}";
/// The route to access the inventory record of a vehicle.
pub const VEHICLE_INVENTORY: &str = "/api/inventory/by_vehicle/{vehicle_code}";

/// The route for listing and creating customer accounts.
pub const CUSTOMERS: &str = "/api/customers";
/// The route to access a single customer account.
pub const CUSTOMER: &str = "/api/customers/{customer_code}";
/// The route for listing customers who have bought a vehicle.
pub const CUSTOMERS_WITH_TRANSACTIONS: &str = "/api/customers/with_transactions";
/// The route for counting the purchases of each customer.
pub const CUSTOMER_TRANSACTION_COUNTS: &str = "/api/customers/transaction_counts";

/// The route for listing and adding staff.
pub const EMPLOYEES: &str = "/api/employees";

/// The route for listing and recording maintenance.
pub const MAINTENANCE: &str = "/api/maintenance";
/// The route to access a single maintenance record.
pub const MAINTENANCE_RECORD: &str = "/api/maintenance/{maintenance_code}";

/// The route for listing sales and for customers to buy a vehicle.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for staff to record a sale.
pub const SALES: &str = "/api/transactions/sales";
/// The route to access a single sale.
pub const TRANSACTION: &str = "/api/transactions/{transaction_code}";
/// The route for getting the amount paid in a sale.
pub const TRANSACTION_TOTAL: &str = "/api/transactions/{transaction_code}/total";

/// Replace the parameter in `endpoint_path` with `code`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/customers/{customer_code}', '{customer_code}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, code: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        code,
        &endpoint_path[param_end..]
    )
}
