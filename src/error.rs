//! Defines the crate level error type.

use time::OffsetDateTime;

/// The errors that may occur while storing, querying or entering transactions.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested transaction was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested transaction could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    ///
    /// This covers everything the durable storage layer can fail with: I/O
    /// errors, corruption, constraint violations and rows that cannot be
    /// decoded into a [Transaction](crate::Transaction).
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The date cannot be represented as a nanosecond Unix timestamp.
    #[error("{0} is outside the range of dates that can be stored")]
    DateOutOfRange(OffsetDateTime),

    /// The amount entered for a new transaction is not a number greater
    /// than zero.
    ///
    /// Holds the text that was entered.
    #[error("\"{0}\" is not a valid amount, enter a number greater than zero")]
    InvalidAmount(String),

    /// The description entered for a new transaction was blank.
    #[error("description cannot be empty")]
    EmptyDescription,

    /// The category entered for a new transaction was blank.
    #[error("category cannot be empty")]
    EmptyCategory,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        tracing::error!("the database lock was poisoned by a panicking thread");
        Error::DatabaseLockError
    }
}
