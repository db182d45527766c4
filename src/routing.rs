//! Application router configuration with public, authenticated and admin route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{admin_guard, auth_guard, get_log_out, post_log_in, register_customer},
    category::{create_category_endpoint, get_categories_endpoint},
    customer::{
        create_customer_endpoint, delete_customer_endpoint, get_customer_endpoint,
        get_customers_endpoint, get_customers_with_transactions_endpoint,
        get_transaction_counts_endpoint, update_customer_endpoint,
    },
    employee::{create_employee_endpoint, get_employees_endpoint},
    endpoints,
    inventory::{
        create_inventory_endpoint, delete_inventory_endpoint, get_inventory_endpoint,
        get_inventory_record_endpoint, get_vehicle_inventory_endpoint, restock_vehicle_endpoint,
    },
    maintenance::{
        create_maintenance_endpoint, delete_maintenance_endpoint, get_maintenance_endpoint,
        get_maintenance_list_endpoint, update_maintenance_endpoint,
    },
    transaction::{
        create_purchase_endpoint, create_sale_endpoint, delete_transaction_endpoint,
        edit_transaction_endpoint, get_transaction_endpoint, get_transaction_total_endpoint,
        get_transactions_endpoint,
    },
    vehicle::{
        create_vehicle_endpoint, delete_vehicle_endpoint, get_premium_vehicles_endpoint,
        get_vehicle_endpoint, get_vehicles_by_price_endpoint, get_vehicles_endpoint,
        hide_vehicle_endpoint, patch_vehicle_endpoint, update_vehicle_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route(endpoints::REGISTER, post(register_customer))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::CATEGORIES, get(get_categories_endpoint))
        .route(endpoints::VEHICLES, get(get_vehicles_endpoint))
        .route(
            endpoints::VEHICLES_BY_PRICE,
            get(get_vehicles_by_price_endpoint),
        )
        .route(
            endpoints::PREMIUM_VEHICLES,
            get(get_premium_vehicles_endpoint),
        )
        .route(endpoints::VEHICLE, get(get_vehicle_endpoint));

    let customer_routes = Router::new()
        .route(endpoints::TRANSACTIONS, post(create_purchase_endpoint))
        .route(endpoints::TRANSACTION, get(get_transaction_endpoint))
        .route(
            endpoints::TRANSACTION_TOTAL,
            get(get_transaction_total_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let admin_routes = Router::new()
        .route(endpoints::CATEGORIES, post(create_category_endpoint))
        .route(endpoints::VEHICLES, post(create_vehicle_endpoint))
        .route(
            endpoints::VEHICLE,
            put(update_vehicle_endpoint)
                .patch(patch_vehicle_endpoint)
                .delete(delete_vehicle_endpoint),
        )
        .route(endpoints::HIDE_VEHICLE, post(hide_vehicle_endpoint))
        .route(
            endpoints::INVENTORY,
            get(get_inventory_endpoint).post(create_inventory_endpoint),
        )
        .route(
            endpoints::INVENTORY_RECORD,
            get(get_inventory_record_endpoint).delete(delete_inventory_endpoint),
        )
        .route(
            endpoints::VEHICLE_INVENTORY,
            get(get_vehicle_inventory_endpoint).put(restock_vehicle_endpoint),
        )
        .route(
            endpoints::CUSTOMERS,
            get(get_customers_endpoint).post(create_customer_endpoint),
        )
        .route(
            endpoints::CUSTOMERS_WITH_TRANSACTIONS,
            get(get_customers_with_transactions_endpoint),
        )
        .route(
            endpoints::CUSTOMER_TRANSACTION_COUNTS,
            get(get_transaction_counts_endpoint),
        )
        .route(
            endpoints::CUSTOMER,
            get(get_customer_endpoint)
                .put(update_customer_endpoint)
                .delete(delete_customer_endpoint),
        )
        .route(
            endpoints::EMPLOYEES,
            get(get_employees_endpoint).post(create_employee_endpoint),
        )
        .route(
            endpoints::MAINTENANCE,
            get(get_maintenance_list_endpoint).post(create_maintenance_endpoint),
        )
        .route(
            endpoints::MAINTENANCE_RECORD,
            get(get_maintenance_endpoint)
                .put(update_maintenance_endpoint)
                .delete(delete_maintenance_endpoint),
        )
        .route(endpoints::TRANSACTIONS, get(get_transactions_endpoint))
        .route(endpoints::SALES, post(create_sale_endpoint))
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .layer(middleware::from_fn(admin_guard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    admin_routes
        .merge(customer_routes)
        .merge(public_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
}
