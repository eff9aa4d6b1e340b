//! Shared fixtures for unit tests.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{db::initialize, transaction::SQLiteTransactionStore};

/// Create a store backed by an initialized in-memory database.
pub fn get_test_store() -> SQLiteTransactionStore {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();

    SQLiteTransactionStore::new(Arc::new(Mutex::new(conn)))
}
