//! The view layer that sits between a presentation layer and the store.
//!
//! A [TransactionView] keeps three live values up to date: the list of all
//! transactions, the total income and the total expense. It also exposes the
//! intents a user can perform (add, update and delete), which are passed on
//! to the store.

use serde::Serialize;
use tokio::sync::watch;

use crate::{
    Error,
    live::{QueryState, Subscription},
    transaction::{
        Transaction, TransactionForm, TransactionStore, TransactionType, ValidatedTransaction,
    },
};

/// The income and expense totals over all transactions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// The sum of all income.
    pub income: f64,
    /// The sum of all expenses.
    pub expense: f64,
}

impl Summary {
    /// Income minus expenses.
    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }
}

/// Live transactions and totals backed by a [TransactionStore].
///
/// Creating the view subscribes to the store. Dropping the view, or calling
/// [TransactionView::close], cancels those subscriptions.
///
/// Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct TransactionView<S: TransactionStore> {
    store: S,
    transactions: Subscription<Vec<Transaction>>,
    total_income: Subscription<f64>,
    total_expense: Subscription<f64>,
}

impl<S: TransactionStore> TransactionView<S> {
    /// Subscribe to the transactions and totals in `store`.
    pub fn new(store: S) -> Self {
        tracing::debug!("Activating transaction view");

        Self {
            transactions: store.query_all(),
            total_income: store.sum_by_type(TransactionType::Income),
            total_expense: store.sum_by_type(TransactionType::Expense),
            store,
        }
    }

    /// All transactions, most recent first.
    pub fn transactions(&self) -> QueryState<Vec<Transaction>> {
        self.transactions.current()
    }

    /// The sum of all income.
    pub fn total_income(&self) -> QueryState<f64> {
        self.total_income.current()
    }

    /// The sum of all expenses.
    pub fn total_expense(&self) -> QueryState<f64> {
        self.total_expense.current()
    }

    /// The total for `transaction_type`.
    pub fn total(&self, transaction_type: TransactionType) -> QueryState<f64> {
        match transaction_type {
            TransactionType::Income => self.total_income(),
            TransactionType::Expense => self.total_expense(),
        }
    }

    /// Both totals, once both are available.
    pub fn summary(&self) -> Option<Summary> {
        match (self.total_income(), self.total_expense()) {
            (QueryState::Ready(income), QueryState::Ready(expense)) => {
                Some(Summary { income, expense })
            }
            _ => None,
        }
    }

    /// Observe the list of transactions.
    pub fn watch_transactions(&self) -> watch::Receiver<QueryState<Vec<Transaction>>> {
        self.transactions.receiver()
    }

    /// Observe the total income.
    pub fn watch_total_income(&self) -> watch::Receiver<QueryState<f64>> {
        self.total_income.receiver()
    }

    /// Observe the total expense.
    pub fn watch_total_expense(&self) -> watch::Receiver<QueryState<f64>> {
        self.total_expense.receiver()
    }

    /// Record a new transaction that happened just now.
    ///
    /// The arguments are stored as given. Use [TransactionView::submit] for
    /// input that has not been validated.
    ///
    /// Returns once the transaction is stored. The live values catch up
    /// afterwards.
    ///
    /// # Errors
    /// Returns an error if the store could not save the transaction.
    pub fn add_transaction(
        &self,
        amount: f64,
        description: &str,
        category: &str,
        transaction_type: TransactionType,
    ) -> Result<Transaction, Error> {
        self.store.insert(Transaction::build(
            amount,
            description,
            category,
            transaction_type,
        ))
    }

    /// Validate `form` and record it as a new transaction.
    ///
    /// # Errors
    /// Returns a validation error if the form is invalid, or an error if the
    /// store could not save the transaction.
    pub fn submit(&self, form: TransactionForm) -> Result<Transaction, Error> {
        let ValidatedTransaction {
            amount,
            description,
            category,
            transaction_type,
        } = form.validate()?;

        self.add_transaction(amount, &description, &category, transaction_type)
    }

    /// Replace a stored transaction.
    ///
    /// # Errors
    /// Returns an error if the store could not save the transaction.
    pub fn update_transaction(&self, transaction: &Transaction) -> Result<(), Error> {
        self.store.update(transaction)
    }

    /// Remove a stored transaction.
    ///
    /// # Errors
    /// Returns an error if the store could not delete the transaction.
    pub fn delete_transaction(&self, transaction: &Transaction) -> Result<(), Error> {
        self.store.delete(transaction)
    }

    /// Cancel the view's subscriptions.
    pub fn close(self) {
        tracing::debug!("Closing transaction view");

        let Self {
            transactions,
            total_income,
            total_expense,
            ..
        } = self;

        transactions.cancel();
        total_income.cancel();
        total_expense.cancel();
    }
}
