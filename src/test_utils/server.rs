use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState,
    auth::COOKIE_TOKEN,
    build_router,
    customer::Role,
    endpoints,
    test_utils::fixtures::{TEST_PASSWORD, insert_test_customer},
};

#[track_caller]
pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, "secret").expect("Could not create app state")
}

/// Create a test server for the full router with "Test User" logged in with `role`.
///
/// The test user is the first customer, so their code is 1.
pub(crate) async fn get_test_server_as(role: Role) -> (TestServer, AppState) {
    let state = get_test_state();
    {
        let connection = state.db_connection.lock().unwrap();
        insert_test_customer("Test User", "test@example.com", role, &connection);
    }

    let mut server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({ "login": "test@example.com", "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
    server.add_cookie(response.cookie(COOKIE_TOKEN));

    (server, state)
}
