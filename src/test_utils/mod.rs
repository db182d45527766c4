#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod server;

pub(crate) use fixtures::{
    TEST_PASSWORD, get_test_connection, insert_test_category, insert_test_customer,
    insert_test_employee, insert_test_inventory, insert_test_sale, insert_test_vehicle,
    test_vehicle_form,
};
pub(crate) use server::{get_test_server_as, get_test_state};
