//! Vehicle categories, e.g. "SUV" or "Hatchback".

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, app_state::lock_connection, database_id::CategoryCode};

/// A group of similar vehicles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub code: CategoryCode,
    pub name: String,
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            code INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
        (),
    )?;

    Ok(())
}

fn map_category_row(row: &rusqlite::Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        code: row.get(0)?,
        name: row.get(1)?,
    })
}

/// Create a category.
///
/// # Errors
/// Returns [Error::Validation] if the name is blank or already taken.
pub fn create_category(name: &str, connection: &Connection) -> Result<Category, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }

    connection
        .prepare("INSERT INTO category (name) VALUES (?1) RETURNING code, name")?
        .query_row([name], map_category_row)
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::validation("name", format!("the category \"{name}\" already exists"))
            }
            error => error.into(),
        })
}

pub fn get_category(code: CategoryCode, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT code, name FROM category WHERE code = :code")?
        .query_row(&[(":code", &code)], map_category_row)
        .map_err(|error| error.into())
}

pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT code, name FROM category ORDER BY name")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// The state needed to get or create categories.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
}

pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_categories(&connection).map(Json)
}

pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(&form.name, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}
