use std::str::FromStr;

use email_address::EmailAddress;
use rusqlite::{
    Connection, OptionalExtension, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash, database_id::CustomerCode};

/// What a logged in customer is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can browse vehicles and buy them for themselves.
    Customer,
    /// Staff with access to every endpoint.
    Admin,
}

impl Role {
    /// The name of the role as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(Error::validation("role", format!("unknown role \"{other}\""))),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A person with an account at the dealership.
///
/// The password hash is never serialized, so a customer can be sent to clients as is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub code: CustomerCode,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: PasswordHash,
    pub phone: String,
    #[serde(with = "time::serde::rfc3339")]
    pub registration_date: OffsetDateTime,
    pub role: Role,
}

/// The data needed to create a [Customer].
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub password: PasswordHash,
    pub phone: String,
    pub role: Role,
}

/// The fields an admin may change on an existing customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerUpdate {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

/// How many purchases a customer has made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerTransactionCount {
    pub customer_code: CustomerCode,
    pub name: String,
    pub transaction_count: u32,
}

pub fn create_customer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS customer (
            code INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            phone TEXT NOT NULL,
            registration_date TEXT NOT NULL,
            role TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

const CUSTOMER_COLUMNS: &str = "code, name, email, password, phone, registration_date, role";

pub fn map_customer_row(row: &rusqlite::Row) -> Result<Customer, rusqlite::Error> {
    Ok(Customer {
        code: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        phone: row.get(4)?,
        registration_date: row.get(5)?,
        role: row.get(6)?,
    })
}

/// Check the name, email and phone number of a customer.
///
/// # Errors
/// Returns [Error::Validation] naming the first field that is blank, or the
/// email field if it is not a valid address.
pub fn validate_contact_details(name: &str, email: &str, phone: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }

    if email.trim().is_empty() {
        return Err(Error::validation("email", "must not be empty"));
    }

    if !EmailAddress::is_valid(email.trim()) {
        return Err(Error::validation("email", "is not a valid email address"));
    }

    if phone.trim().is_empty() {
        return Err(Error::validation("phone", "must not be empty"));
    }

    Ok(())
}

/// Create a customer, registered as of now.
///
/// # Errors
/// - [Error::Validation] if the contact details are invalid.
/// - [Error::DuplicateEmail] if another customer has the same email address.
pub fn create_customer(customer: NewCustomer, connection: &Connection) -> Result<Customer, Error> {
    validate_contact_details(&customer.name, &customer.email, &customer.phone)?;

    let customer = connection
        .prepare(&format!(
            "INSERT INTO customer (name, email, password, phone, registration_date, role)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {CUSTOMER_COLUMNS}"
        ))?
        .query_row(
            (
                customer.name.trim(),
                customer.email.trim(),
                &customer.password,
                customer.phone.trim(),
                OffsetDateTime::now_utc(),
                customer.role,
            ),
            map_customer_row,
        )?;

    Ok(customer)
}

/// Get a customer by their code.
///
/// # Errors
/// Returns [Error::NotFound] if no customer has the code.
pub fn get_customer(code: CustomerCode, connection: &Connection) -> Result<Customer, Error> {
    connection
        .prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE code = :code"
        ))?
        .query_row(&[(":code", &code)], map_customer_row)
        .map_err(|error| error.into())
}

/// Find the customer that logs in with `login`, which may be either their
/// email address or their name.
///
/// Email addresses are unique, so a matching email takes precedence over a matching name.
///
/// # Errors
/// Returns [Error::NotFound] if no customer matches.
pub fn get_customer_by_login(login: &str, connection: &Connection) -> Result<Customer, Error> {
    connection
        .prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer
            WHERE email = :login OR name = :login
            ORDER BY email = :login DESC, code ASC
            LIMIT 1"
        ))?
        .query_row(&[(":login", &login)], map_customer_row)
        .map_err(|error| error.into())
}

/// Whether a customer has already registered with `email`.
pub fn email_exists(email: &str, connection: &Connection) -> Result<bool, Error> {
    let code: Option<CustomerCode> = connection
        .query_row(
            "SELECT code FROM customer WHERE email = ?1",
            [email],
            |row| row.get(0),
        )
        .optional()?;

    Ok(code.is_some())
}

pub fn get_all_customers(connection: &Connection) -> Result<Vec<Customer>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer ORDER BY code"
        ))?
        .query_map([], map_customer_row)?
        .map(|maybe_customer| maybe_customer.map_err(Error::from))
        .collect()
}

/// Replace the contact details and role of a customer.
///
/// The password and registration date are left untouched.
///
/// # Errors
/// - [Error::NotFound] if no customer has the code.
/// - [Error::Validation] if the contact details are invalid.
/// - [Error::DuplicateEmail] if another customer has the new email address.
pub fn update_customer(
    code: CustomerCode,
    update: &CustomerUpdate,
    connection: &Connection,
) -> Result<Customer, Error> {
    validate_contact_details(&update.name, &update.email, &update.phone)?;

    connection
        .prepare(&format!(
            "UPDATE customer SET name = ?1, email = ?2, phone = ?3, role = ?4
            WHERE code = ?5
            RETURNING {CUSTOMER_COLUMNS}"
        ))?
        .query_row(
            (
                update.name.trim(),
                update.email.trim(),
                update.phone.trim(),
                update.role,
                code,
            ),
            map_customer_row,
        )
        .map_err(|error| error.into())
}

type RowsAffected = usize;

/// Delete a customer.
///
/// # Errors
/// Returns [Error::InUse] if the customer has made a purchase.
pub fn delete_customer(code: CustomerCode, connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute("DELETE FROM customer WHERE code = :code", &[(":code", &code)])
        .map_err(|error| match Error::from(error) {
            Error::InvalidReference => Error::InUse,
            error => error,
        })
}

/// Get the customers that have bought at least one vehicle.
pub fn get_customers_with_transactions(connection: &Connection) -> Result<Vec<Customer>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer
            WHERE EXISTS (
                SELECT 1 FROM \"transaction\" WHERE \"transaction\".customer_code = customer.code
            )
            ORDER BY code"
        ))?
        .query_map([], map_customer_row)?
        .map(|maybe_customer| maybe_customer.map_err(Error::from))
        .collect()
}

/// Count the purchases of every customer, including customers with none.
pub fn get_transaction_counts(
    connection: &Connection,
) -> Result<Vec<CustomerTransactionCount>, Error> {
    connection
        .prepare(
            "SELECT customer.code, customer.name, COUNT(\"transaction\".code)
            FROM customer
            LEFT JOIN \"transaction\" ON \"transaction\".customer_code = customer.code
            GROUP BY customer.code
            ORDER BY customer.code",
        )?
        .query_map([], |row| {
            Ok(CustomerTransactionCount {
                customer_code: row.get(0)?,
                name: row.get(1)?,
                transaction_count: row.get(2)?,
            })
        })?
        .map(|maybe_count| maybe_count.map_err(Error::from))
        .collect()
}


#[cfg(test)]
mod role_tests {
    use crate::{Error, customer::Role};

    #[test]
    fn parses_stored_names() {
        assert_eq!("customer".parse::<Role>(), Ok(Role::Customer));
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(matches!(
            "owner".parse::<Role>(),
            Err(Error::Validation { field: "role", .. })
        ));
    }
}
