//! Database setup: connection settings and the schema for the domain models.

use std::time::Duration;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, category::create_category_table, customer::create_customer_table,
    employee::create_employee_table, inventory::create_inventory_table,
    maintenance::create_maintenance_table, transaction::create_transaction_table,
    vehicle::create_vehicle_table,
};

/// How long a connection waits for another connection's write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Apply the per-connection settings the application relies on.
///
/// Foreign key enforcement is off by default in SQLite and must be enabled on
/// every connection. The busy timeout makes concurrent writers wait for the
/// write lock instead of failing immediately.
///
/// # Errors
/// Returns an error if a pragma could not be set.
pub fn configure_connection(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;
    connection.busy_timeout(BUSY_TIMEOUT)?;

    Ok(())
}

/// Switch a file-backed database to write-ahead logging so that readers do
/// not block the writer.
///
/// Returns the journal mode reported by SQLite, which is "memory" for
/// in-memory databases.
///
/// # Errors
/// Returns an error if the pragma could not be set.
pub fn use_write_ahead_log(connection: &Connection) -> Result<String, Error> {
    let mode = connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    })?;

    Ok(mode)
}

/// Configure `connection` and create the tables for the domain models if
/// they do not already exist.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must happen outside of a transaction, SQLite ignores the foreign_keys pragma otherwise.
    configure_connection(connection)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_vehicle_table(&transaction)?;
    create_inventory_table(&transaction)?;
    create_customer_table(&transaction)?;
    create_employee_table(&transaction)?;
    create_maintenance_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{initialize, use_write_ahead_log};

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert_eq!(initialize(&connection), Ok(()));
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let foreign_keys: i64 = connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();

        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn in_memory_database_keeps_memory_journal() {
        let connection = Connection::open_in_memory().unwrap();

        let mode = use_write_ahead_log(&connection).unwrap();

        assert_eq!(mode, "memory");
    }
}
