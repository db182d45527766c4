use rusqlite::{Connection, OptionalExtension};
use time::macros::datetime;

use crate::{
    auth::PasswordHash,
    category::{Category, create_category},
    customer::{Customer, NewCustomer, Role, create_customer},
    db::initialize,
    employee::{Employee, EmployeeForm, create_employee},
    inventory::{InventoryRecord, NewInventoryRecord, create_inventory_record},
    transaction::{SaleRequest, Transaction, create_sale},
    vehicle::{Vehicle, VehicleForm, create_vehicle},
};

/// The password of every customer created with [insert_test_customer].
pub(crate) const TEST_PASSWORD: &str = "correct horse battery staple 42";

/// The lowest cost bcrypt accepts, which keeps the tests fast.
const TEST_HASH_COST: u32 = 4;

#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

#[track_caller]
pub(crate) fn insert_test_customer(
    name: &str,
    email: &str,
    role: Role,
    connection: &Connection,
) -> Customer {
    let password = PasswordHash::from_raw_password(TEST_PASSWORD, TEST_HASH_COST)
        .expect("Could not hash test password");

    create_customer(
        NewCustomer {
            name: name.to_owned(),
            email: email.to_owned(),
            password,
            phone: "021 555 0100".to_owned(),
            role,
        },
        connection,
    )
    .expect("Could not create test customer")
}

#[track_caller]
pub(crate) fn insert_test_category(name: &str, connection: &Connection) -> Category {
    create_category(name, connection).expect("Could not create test category")
}

pub(crate) fn test_vehicle_form(category_code: i64, price: f64) -> VehicleForm {
    VehicleForm {
        name: "Corolla".to_owned(),
        category_code,
        price,
        year: 2020,
        mileage: 10_000,
        image: None,
        is_visible: true,
    }
}

/// Create a visible vehicle in the "Sedan" category, creating the category if needed.
#[track_caller]
pub(crate) fn insert_test_vehicle(price: f64, connection: &Connection) -> Vehicle {
    let category_code = connection
        .query_row(
            "SELECT code FROM category WHERE name = 'Sedan'",
            [],
            |row| row.get(0),
        )
        .optional()
        .expect("Could not query categories");
    let category_code = match category_code {
        Some(code) => code,
        None => insert_test_category("Sedan", connection).code,
    };

    create_vehicle(&test_vehicle_form(category_code, price), connection)
        .expect("Could not create test vehicle")
}

#[track_caller]
pub(crate) fn insert_test_inventory(
    vehicle_code: i64,
    stock_quantity: u32,
    connection: &Connection,
) -> InventoryRecord {
    create_inventory_record(
        &NewInventoryRecord {
            vehicle_code,
            manufacturer_code: 1,
            stock_quantity: stock_quantity.into(),
        },
        connection,
    )
    .expect("Could not create test inventory record")
}

#[track_caller]
pub(crate) fn insert_test_employee(name: &str, connection: &Connection) -> Employee {
    create_employee(
        &EmployeeForm {
            name: name.to_owned(),
            department_code: 1,
        },
        connection,
    )
    .expect("Could not create test employee")
}

/// Sell one of two units of a new vehicle to a new customer through a new employee.
#[track_caller]
pub(crate) fn insert_test_sale(connection: &Connection) -> Transaction {
    let vehicle = insert_test_vehicle(20_000.0, connection);
    insert_test_inventory(vehicle.code, 2, connection);
    let customer = insert_test_customer("Buyer", "buyer@example.com", Role::Customer, connection);
    let employee = insert_test_employee("Morgan", connection);

    create_sale(
        &SaleRequest {
            vehicle_code: vehicle.code,
            customer_code: customer.code,
            employee_code: Some(employee.code),
            price: 20_000.0,
            transaction_date: Some(datetime!(2025-01-10 14:30 UTC)),
        },
        connection,
    )
    .expect("Could not create test sale")
}
