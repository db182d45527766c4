//! The staff who record sales.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::{DepartmentCode, EmployeeCode},
};

/// A member of staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub code: EmployeeCode,
    pub name: String,
    pub department_code: DepartmentCode,
}

/// The request body for adding a member of staff.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeForm {
    pub name: String,
    pub department_code: DepartmentCode,
}

pub fn create_employee_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS employee (
            code INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            department_code INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_employee_row(row: &rusqlite::Row) -> Result<Employee, rusqlite::Error> {
    Ok(Employee {
        code: row.get(0)?,
        name: row.get(1)?,
        department_code: row.get(2)?,
    })
}

pub fn create_employee(form: &EmployeeForm, connection: &Connection) -> Result<Employee, Error> {
    let name = form.name.trim();

    if name.is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }

    connection
        .prepare(
            "INSERT INTO employee (name, department_code) VALUES (?1, ?2)
            RETURNING code, name, department_code",
        )?
        .query_row((name, form.department_code), map_employee_row)
        .map_err(|error| error.into())
}

/// Look up a member of staff.
///
/// # Errors
/// Returns [Error::NotFound] if no employee has the code.
pub fn get_employee(code: EmployeeCode, connection: &Connection) -> Result<Employee, Error> {
    connection
        .prepare("SELECT code, name, department_code FROM employee WHERE code = :code")?
        .query_row(&[(":code", &code)], map_employee_row)
        .map_err(|error| error.into())
}

pub fn get_all_employees(connection: &Connection) -> Result<Vec<Employee>, Error> {
    connection
        .prepare("SELECT code, name, department_code FROM employee ORDER BY code")?
        .query_map([], map_employee_row)?
        .map(|maybe_employee| maybe_employee.map_err(Error::from))
        .collect()
}

/// The state needed to manage staff.
#[derive(Debug, Clone)]
pub struct EmployeeState {
    /// The database connection for managing staff.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EmployeeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_employees_endpoint(
    State(state): State<EmployeeState>,
) -> Result<Json<Vec<Employee>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_employees(&connection).map(Json)
}

pub async fn create_employee_endpoint(
    State(state): State<EmployeeState>,
    Json(form): Json<EmployeeForm>,
) -> Result<(StatusCode, Json<Employee>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let employee = create_employee(&form, &connection)?;

    tracing::info!("Added employee {} \"{}\"", employee.code, employee.name);

    Ok((StatusCode::CREATED, Json(employee)))
}
