//! A personal finance tracker.
//!
//! Record income and expense transactions in a local SQLite database and keep
//! a running view of every transaction alongside the total income and total
//! expense.
//!
//! The pieces, leaves first:
//! - [Transaction] and [TransactionType] describe a single record and how it
//!   maps to the `transactions` table.
//! - [TransactionStore] stores and queries transactions. Its live queries
//!   return a [Subscription] that pushes a fresh result after every change.
//! - [TransactionView] subscribes to the list and totals and passes user
//!   intents on to the store.
//!
//! ```no_run
//! use finance_tracker::{QueryState, TransactionType, TransactionView, open_store};
//!
//! # async fn example() -> Result<(), finance_tracker::Error> {
//! let store = open_store("finances.db")?;
//! let view = TransactionView::new(store);
//!
//! view.add_transaction(50.0, "Lunch", "Food", TransactionType::Expense)?;
//!
//! let mut expense = view.watch_total_expense();
//! expense.wait_for(|total| total == &QueryState::Ready(50.0)).await.ok();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

mod database_id;
mod error;
mod live;
mod logging;
mod transaction;
mod view;

pub mod db;

#[cfg(test)]
mod test_utils;

pub use database_id::{DatabaseId, TransactionId};
pub use error::Error;
pub use live::{QueryState, Subscription};
pub use logging::{DEFAULT_LOG_FILTER, setup_logging};
pub use transaction::{
    SQLiteTransactionStore, SortOrder, Transaction, TransactionBuilder, TransactionForm,
    TransactionQuery, TransactionStore, TransactionType, UnknownTransactionType,
    ValidatedTransaction,
};
pub use view::{Summary, TransactionView};

/// Open the SQLite database at `path`, creating and initializing it if
/// needed, and return a store for its transactions.
///
/// # Errors
/// Returns an error if the database cannot be opened or initialized.
pub fn open_store(path: impl AsRef<Path>) -> Result<SQLiteTransactionStore, Error> {
    let connection = db::open(path)?;

    Ok(SQLiteTransactionStore::new(Arc::new(Mutex::new(
        connection,
    ))))
}
