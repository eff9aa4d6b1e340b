//! Defines the transaction store trait.

use tokio::sync::watch;

use crate::{
    Error,
    database_id::TransactionId,
    live::Subscription,
    transaction::{Transaction, TransactionBuilder, TransactionType},
};

/// Handles the storage and retrieval of transactions.
///
/// Every mutation that changes a stored row must advance the version
/// published by [TransactionStore::changes]. The live queries provided by
/// this trait rerun whenever that happens.
pub trait TransactionStore: Clone + Send + Sync + 'static {
    /// Store a transaction.
    ///
    /// If `builder.id` refers to an existing transaction, that transaction is
    /// replaced. Otherwise a new transaction is created, with the next ID if
    /// `builder.id` is `None`.
    fn insert(&self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Replace the stored transaction with the same ID as `transaction`.
    ///
    /// Does nothing if there is no such transaction.
    fn update(&self, transaction: &Transaction) -> Result<(), Error>;

    /// Remove the stored transaction with the same ID as `transaction`.
    ///
    /// Does nothing if there is no such transaction.
    fn delete(&self, transaction: &Transaction) -> Result<(), Error>;

    /// Retrieve a transaction from the store.
    fn get(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Retrieve transactions from the store in the way defined by `query`.
    fn get_query(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, Error>;

    /// The sum of the amounts of all transactions of `transaction_type`.
    ///
    /// Zero if there are none.
    fn total_by_type(&self, transaction_type: TransactionType) -> Result<f64, Error>;

    /// Get the total number of transactions in the store.
    fn count(&self) -> Result<usize, Error>;

    /// A receiver for the store's change version.
    fn changes(&self) -> watch::Receiver<u64>;

    /// A live view of the transactions selected by `query`.
    fn query(&self, query: TransactionQuery) -> Subscription<Vec<Transaction>> {
        let store = self.clone();

        Subscription::spawn(self.changes(), move || store.get_query(&query))
    }

    /// A live view of all transactions, most recent first.
    fn query_all(&self) -> Subscription<Vec<Transaction>> {
        self.query(TransactionQuery::most_recent_first())
    }

    /// A live view of the transactions of `transaction_type`, most recent first.
    fn query_by_type(&self, transaction_type: TransactionType) -> Subscription<Vec<Transaction>> {
        self.query(TransactionQuery {
            transaction_type: Some(transaction_type),
            ..TransactionQuery::most_recent_first()
        })
    }

    /// A live view of the transactions in `category`, most recent first.
    ///
    /// Categories are matched exactly, including case.
    fn query_by_category(&self, category: &str) -> Subscription<Vec<Transaction>> {
        self.query(TransactionQuery {
            category: Some(category.to_owned()),
            ..TransactionQuery::most_recent_first()
        })
    }

    /// A live view of the sum of the amounts of the transactions of
    /// `transaction_type`.
    fn sum_by_type(&self, transaction_type: TransactionType) -> Subscription<f64> {
        let store = self.clone();

        Subscription::spawn(self.changes(), move || store.total_by_type(transaction_type))
    }
}

/// Defines how transactions should be fetched from [TransactionStore::get_query].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// Only include transactions of this type.
    pub transaction_type: Option<TransactionType>,
    /// Only include transactions whose category is exactly this.
    pub category: Option<String>,
    /// Orders transactions by date in the order `sort_date`. None returns transactions in the
    /// order they are stored.
    pub sort_date: Option<SortOrder>,
    /// Selects up to the first N (`limit`) transactions.
    pub limit: Option<u64>,
}

impl TransactionQuery {
    /// Select every transaction, most recent first.
    pub fn most_recent_first() -> Self {
        Self {
            sort_date: Some(SortOrder::Descending),
            ..Default::default()
        }
    }
}

/// The order to sort transactions in a [TransactionQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}
