//! Dealership is a web backend for running a vehicle dealership.
//!
//! This library provides a JSON REST API for managing customers, vehicles,
//! inventory, maintenance records and sales transactions.
//! Sales are created through [create_sale], which records the transaction and
//! takes the vehicle out of stock in a single database transaction.

#![warn(missing_docs)]

use std::{fmt::Display, net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod cors;
mod customer;
mod database_id;
mod db;
mod employee;
mod endpoints;
mod inventory;
mod logging;
mod maintenance;
mod routing;
mod transaction;
mod vehicle;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use cors::build_cors_layer;
pub use customer::{Customer, NewCustomer, Role, create_customer};
pub use database_id::DatabaseId;
pub use db::{configure_connection, initialize as initialize_db, use_write_ahead_log};
pub use logging::logging_middleware;
pub use routing::build_router;
pub use inventory::get_stock;
pub use transaction::{SaleRequest, Transaction, count_transactions, create_sale};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The kinds of records that other records may refer to by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A vehicle category.
    Category,
    /// A registered customer.
    Customer,
    /// A member of staff.
    Employee,
    /// A vehicle for sale.
    Vehicle,
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Category => "category",
            Entity::Customer => "customer",
            Entity::Employee => "employee",
            Entity::Vehicle => "vehicle",
        };

        write!(f, "{name}")
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The login name, email or password did not match a registered customer.
    #[error("invalid login or password")]
    InvalidCredentials,

    /// The request did not carry a valid auth cookie.
    #[error("you must be logged in to access this resource")]
    Unauthenticated,

    /// The logged in customer does not have the role needed for the request.
    #[error("you do not have permission to access this resource")]
    Forbidden,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., code) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A code in the request does not refer to an existing record.
    #[error("no {entity} exists with the code {code}")]
    ReferenceNotFound {
        /// The kind of record that was referenced.
        entity: Entity,
        /// The code that could not be resolved.
        code: DatabaseId,
    },

    /// The vehicle has no stock left to sell.
    #[error("vehicle {vehicle_code} is out of stock")]
    OutOfStock {
        /// The vehicle that could not be sold.
        vehicle_code: DatabaseId,
    },

    /// A field in the request failed validation.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// The name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The email address is already used by another customer.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The record cannot be deleted while other records refer to it.
    #[error("the resource is referenced by other records and cannot be deleted")]
    InUse,

    /// A foreign key in an insert or update did not match an existing record.
    #[error("the request refers to a record that does not exist")]
    InvalidReference,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl Error {
    /// Shorthand for creating a [Error::Validation].
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("customer.email") =>
            {
                Error::DuplicateEmail
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed on insert or update.
            // Code 1811 occurs when an ON DELETE RESTRICT foreign key blocked a delete.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 || sql_error.extended_code == 1811 =>
            {
                Error::InvalidReference
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateEmail | Error::InUse | Error::OutOfStock { .. } => StatusCode::CONFLICT,
            Error::ReferenceNotFound { .. } | Error::InvalidReference | Error::TooWeak(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            _ => {
                tracing::error!("An unexpected error occurred: {}", self);

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "an internal error occurred, try again later or check the server logs",
                    })),
                )
                    .into_response();
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Entity, Error};

    #[test]
    fn maps_no_rows_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn maps_restricted_delete_to_invalid_reference() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "PRAGMA foreign_keys = ON;
                CREATE TABLE parent (code INTEGER PRIMARY KEY);
                CREATE TABLE child (
                    code INTEGER PRIMARY KEY,
                    parent_code INTEGER NOT NULL,
                    FOREIGN KEY(parent_code) REFERENCES parent(code) ON DELETE RESTRICT
                );
                INSERT INTO parent (code) VALUES (1);
                INSERT INTO child (parent_code) VALUES (1);",
            )
            .unwrap();

        let error: Error = connection
            .execute("DELETE FROM parent WHERE code = 1", [])
            .unwrap_err()
            .into();

        assert_eq!(error, Error::InvalidReference);
    }

    #[test]
    fn maps_missing_parent_to_invalid_reference() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "PRAGMA foreign_keys = ON;
                CREATE TABLE parent (code INTEGER PRIMARY KEY);
                CREATE TABLE child (
                    code INTEGER PRIMARY KEY,
                    parent_code INTEGER NOT NULL,
                    FOREIGN KEY(parent_code) REFERENCES parent(code) ON DELETE RESTRICT
                );",
            )
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO child (parent_code) VALUES (42)", [])
            .unwrap_err()
            .into();

        assert_eq!(error, Error::InvalidReference);
    }

    #[test]
    fn reference_not_found_names_entity_and_code() {
        let error = Error::ReferenceNotFound {
            entity: Entity::Employee,
            code: 9999,
        };

        assert_eq!(error.to_string(), "no employee exists with the code 9999");
    }

    #[test]
    fn each_failure_kind_has_distinct_status() {
        let cases = [
            (Error::validation("price", "must be positive"), StatusCode::BAD_REQUEST),
            (Error::Unauthenticated, StatusCode::UNAUTHORIZED),
            (Error::Forbidden, StatusCode::FORBIDDEN),
            (Error::NotFound, StatusCode::NOT_FOUND),
            (Error::OutOfStock { vehicle_code: 1 }, StatusCode::CONFLICT),
            (
                Error::ReferenceNotFound {
                    entity: Entity::Vehicle,
                    code: 1,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (Error::DatabaseLockError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, want) in cases {
            let message = error.to_string();
            let got = error.into_response().status();

            assert_eq!(got, want, "wrong status for \"{message}\"");
        }
    }
}
