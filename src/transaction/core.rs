//! Defines the core data models for transactions and how they map to rows in
//! the `transactions` table.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Money that was earned, e.g. a salary.
    Income,
    /// Money that was spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The text used to store the type in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The text stored in the `type` column was not a known [TransactionType].
#[derive(Debug, thiserror::Error)]
#[error("\"{0}\" is not a valid transaction type")]
pub struct UnknownTransactionType(String);

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Income" => Ok(TransactionType::Income),
            "Expense" => Ok(TransactionType::Expense),
            other => Err(FromSqlError::Other(Box::new(UnknownTransactionType(
                other.to_owned(),
            )))),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build] and insert the
/// builder into a [TransactionStore](crate::TransactionStore), which assigns
/// the ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned in this transaction.
    ///
    /// Amounts are expected to be positive, [Transaction::transaction_type]
    /// says which direction the money went.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// A label used to group transactions, e.g. "Food" or "Rent".
    pub category: String,
    /// When the transaction happened, in UTC.
    pub date: OffsetDateTime,
    /// Whether the money was earned or spent.
    pub transaction_type: TransactionType,
    /// Whether the transaction repeats, e.g. a monthly subscription.
    pub is_recurring: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        description: &str,
        category: &str,
        transaction_type: TransactionType,
    ) -> TransactionBuilder {
        TransactionBuilder {
            id: None,
            amount,
            description: description.to_owned(),
            category: category.to_owned(),
            date: OffsetDateTime::now_utc(),
            transaction_type,
            is_recurring: false,
        }
    }
}

/// A builder for transactions that have not been stored yet.
///
/// # Examples
///
/// ```
/// use finance_tracker::{Transaction, TransactionType};
/// use time::macros::datetime;
///
/// let lunch = Transaction::build(12.5, "Lunch", "Food", TransactionType::Expense)
///     .date(datetime!(2025-03-14 12:30 UTC));
///
/// assert_eq!(lunch.id, None);
/// assert!(!lunch.is_recurring);
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The ID to store the transaction under.
    ///
    /// `None` lets the store assign the next ID. If a transaction with this
    /// ID already exists it is replaced.
    pub id: Option<TransactionId>,

    /// The amount of money spent or earned.
    ///
    /// Stored as given, no validation happens at the store.
    pub amount: f64,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The label used to group transactions.
    pub category: String,

    /// When the transaction occurred.
    ///
    /// Defaults to the time the builder was created.
    pub date: OffsetDateTime,

    /// Whether the money was earned or spent.
    pub transaction_type: TransactionType,

    /// Whether the transaction repeats. Defaults to `false`.
    pub is_recurring: bool,
}

impl TransactionBuilder {
    /// Set the ID the transaction is stored under.
    pub fn id(mut self, id: Option<TransactionId>) -> Self {
        self.id = id;
        self
    }

    /// Set the date of the transaction.
    ///
    /// The date is converted to UTC.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = date.to_offset(UtcOffset::UTC);
        self
    }

    /// Mark the transaction as recurring.
    pub fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = is_recurring;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns of the `transactions` table in the order [map_transaction_row]
/// expects them.
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, amount, description, category, date, type, is_recurring";

/// Create the transactions table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                date INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('Income', 'Expense')),
                is_recurring INTEGER NOT NULL DEFAULT 0
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT INTO sqlite_sequence (name, seq)
         SELECT 'transactions', 0
         WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = 'transactions')",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_type_date ON transactions(type, date);",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_category_date ON transactions(category, date);",
        (),
    )?;

    Ok(())
}

/// Convert a date to the nanosecond Unix timestamp stored in the `date` column.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the timestamp does not fit in an `i64`.
pub(crate) fn encode_date(date: OffsetDateTime) -> Result<i64, Error> {
    i64::try_from(date.unix_timestamp_nanos()).map_err(|_| Error::DateOutOfRange(date))
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let description = row.get(2)?;
    let category = row.get(3)?;
    let raw_date: i64 = row.get(4)?;
    let transaction_type = row.get(5)?;
    let is_recurring = row.get(6)?;

    let date = OffsetDateTime::from_unix_timestamp_nanos(raw_date.into()).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, Box::new(error))
    })?;

    Ok(Transaction {
        id,
        amount,
        description,
        category,
        date,
        transaction_type,
        is_recurring,
    })
}

// ============================================================================
// TESTS
// ============================================================================
