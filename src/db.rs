//! Sets up the application's SQLite database.

use std::path::Path;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{Error, transaction::create_transaction_table};

/// Create the tables for the domain models if they do not exist yet.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Open the SQLite database at `path`, creating the file if needed, and
/// initialize it.
///
/// # Errors
/// Returns an error if the file cannot be opened or the tables cannot be created.
pub fn open(path: impl AsRef<Path>) -> Result<Connection, Error> {
    let path = path.as_ref();
    tracing::debug!("Opening database at {path:?}");

    let connection = Connection::open(path)?;
    initialize(&connection)?;

    Ok(connection)
}
