//! Database setup and the shared helpers for working with the SQLite connection.

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{
    Error, category::create_category_table, expense::create_expense_table,
    user::create_user_table,
};

/// Create the tables for all the domain models.
///
/// Foreign key enforcement is switched on for `connection` so that deleting
/// a category clears the category of its expenses.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the lock on the shared database connection.
///
/// # Errors
/// Returns an [Error::DatabaseLockError] if the mutex has been poisoned.
pub fn lock_connection(
    db_connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
