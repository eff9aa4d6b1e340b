//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - The `TransactionStore` trait and its SQLite implementation
//! - Validation of transactions entered by the user

mod core;
mod form;
mod sqlite;
mod store;

pub use core::{
    Transaction, TransactionBuilder, TransactionType, UnknownTransactionType,
    create_transaction_table, map_transaction_row,
};
pub use form::{TransactionForm, ValidatedTransaction};
pub use sqlite::SQLiteTransactionStore;
pub use store::{SortOrder, TransactionQuery, TransactionStore};
