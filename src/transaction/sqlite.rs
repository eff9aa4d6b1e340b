//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, params_from_iter, types::Value};
use tokio::sync::watch;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        SortOrder, Transaction, TransactionBuilder, TransactionQuery, TransactionStore,
        TransactionType,
        core::{TRANSACTION_COLUMNS, encode_date, map_transaction_row},
    },
};

/// Stores transactions in the `transactions` table of a SQLite database.
///
/// Clones share the same connection and change version, so a mutation made
/// through one clone reaches the live queries of all of them.
///
/// The tables must have been created with [initialize](crate::db::initialize)
/// before the store is used.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
    changes: Arc<watch::Sender<u64>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            connection,
            changes: Arc::new(changes),
        }
    }

    fn notify_changed(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Insert or replace a transaction in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DateOutOfRange] if the date cannot be stored,
    /// - [Error::DatabaseLockError] if the database lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn insert(&self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let date = encode_date(builder.date)?;

        let transaction = self
            .connection
            .lock()?
            .prepare(&format!(
                "INSERT INTO transactions (id, amount, description, category, date, type, is_recurring)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    amount = excluded.amount,
                    description = excluded.description,
                    category = excluded.category,
                    date = excluded.date,
                    type = excluded.type,
                    is_recurring = excluded.is_recurring
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    builder.id,
                    builder.amount,
                    &builder.description,
                    &builder.category,
                    date,
                    builder.transaction_type,
                    builder.is_recurring,
                ),
                map_transaction_row,
            )?;

        tracing::debug!(
            "Stored {} transaction {} for {}",
            transaction.transaction_type,
            transaction.id,
            transaction.amount
        );
        self.notify_changed();

        Ok(transaction)
    }

    /// Replace a transaction in the database.
    ///
    /// Updating a transaction that does not exist is a no-op.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DateOutOfRange] if the date cannot be stored,
    /// - [Error::DatabaseLockError] if the database lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&self, transaction: &Transaction) -> Result<(), Error> {
        let date = encode_date(transaction.date)?;

        let rows_affected = self.connection.lock()?.execute(
            "UPDATE transactions
             SET amount = ?2, description = ?3, category = ?4, date = ?5, type = ?6, is_recurring = ?7
             WHERE id = ?1",
            (
                transaction.id,
                transaction.amount,
                &transaction.description,
                &transaction.category,
                date,
                transaction.transaction_type,
                transaction.is_recurring,
            ),
        )?;

        if rows_affected == 0 {
            tracing::debug!(
                "Ignoring update to transaction {} which is not in the database",
                transaction.id
            );
            return Ok(());
        }

        tracing::debug!("Updated transaction {}", transaction.id);
        self.notify_changed();

        Ok(())
    }

    /// Delete a transaction from the database.
    ///
    /// Deleting a transaction that does not exist is a no-op.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DatabaseLockError] if the database lock is poisoned,
    /// - or [Error::SqlError] if there is some SQL error.
    fn delete(&self, transaction: &Transaction) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()?
            .execute("DELETE FROM transactions WHERE id = ?1", (transaction.id,))?;

        if rows_affected == 0 {
            tracing::debug!(
                "Ignoring delete of transaction {} which is not in the database",
                transaction.id
            );
            return Ok(());
        }

        tracing::debug!("Deleted transaction {}", transaction.id);
        self.notify_changed();

        Ok(())
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] there is some other SQL error.
    fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        let transaction = self
            .connection
            .lock()?
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = :id"
            ))?
            .query_row(&[(":id", &id)], map_transaction_row)?;

        Ok(transaction)
    }

    /// Query for transactions in the database.
    ///
    /// Transactions with the same date are ordered by ID in the same
    /// direction as the dates.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] there is a SQL error.
    fn get_query(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let mut query_string_parts =
            vec![format!("SELECT {TRANSACTION_COLUMNS} FROM transactions")];
        let mut where_clause_parts = vec![];
        let mut query_parameters = vec![];

        if let Some(transaction_type) = query.transaction_type {
            where_clause_parts.push(format!("type = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(transaction_type.as_str().to_owned()));
        }

        if let Some(category) = &query.category {
            where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(category.clone()));
        }

        if !where_clause_parts.is_empty() {
            query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
        }

        match query.sort_date {
            Some(SortOrder::Ascending) => {
                query_string_parts.push("ORDER BY date ASC, id ASC".to_string())
            }
            Some(SortOrder::Descending) => {
                query_string_parts.push("ORDER BY date DESC, id DESC".to_string())
            }
            None => {}
        }

        if let Some(limit) = query.limit {
            query_string_parts.push(format!("LIMIT {limit}"));
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()?
            .prepare(&query_string)?
            .query_map(params, map_transaction_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    /// Sum the amounts of the transactions of `transaction_type`.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] there is a SQL error.
    fn total_by_type(&self, transaction_type: TransactionType) -> Result<f64, Error> {
        self.connection
            .lock()?
            .query_row(
                "SELECT COALESCE(SUM(amount), 0.0) FROM transactions WHERE type = ?1",
                (transaction_type,),
                |row| row.get(0),
            )
            .map_err(Error::from)
    }

    /// Get the total number of transactions in the database.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] there is some SQL error.
    fn count(&self) -> Result<usize, Error> {
        let count: i64 = self.connection.lock()?.query_row(
            "SELECT COUNT(id) FROM transactions;",
            [],
            |row| row.get(0),
        )?;

        // COUNT is never negative.
        Ok(count as usize)
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod sqlite_transaction_store_tests {
    use time::{Duration, macros::datetime};

    use crate::{
        Error,
        live::QueryState,
        test_utils::get_test_store,
        transaction::{Transaction, TransactionQuery, TransactionStore, TransactionType},
    };

    #[test]
    fn insert_assigns_increasing_ids() {
        let store = get_test_store();

        let first = store
            .insert(Transaction::build(
                50.0,
                "Lunch",
                "Food",
                TransactionType::Expense,
            ))
            .unwrap();
        let second = store
            .insert(Transaction::build(
                1000.0,
                "Salary",
                "Work",
                TransactionType::Income,
            ))
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn insert_returns_stored_transaction() {
        let store = get_test_store();
        let date = datetime!(2025-02-03 04:05:06.789 UTC);

        let transaction = store
            .insert(
                Transaction::build(12.34, "Bus fare", "Transport", TransactionType::Expense)
                    .date(date)
                    .recurring(true),
            )
            .unwrap();

        assert_eq!(store.get(transaction.id), Ok(transaction.clone()));
        assert_eq!(transaction.amount, 12.34);
        assert_eq!(transaction.description, "Bus fare");
        assert_eq!(transaction.category, "Transport");
        assert_eq!(transaction.date, date);
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert!(transaction.is_recurring);
    }

    #[test]
    fn insert_with_existing_id_replaces_record() {
        let store = get_test_store();
        let original = store
            .insert(Transaction::build(50.0, "Lunch", "Food", TransactionType::Expense).id(Some(7)))
            .unwrap();

        let replacement = store
            .insert(
                Transaction::build(2.0, "Refund", "Misc", TransactionType::Income)
                    .id(Some(original.id)),
            )
            .unwrap();

        assert_eq!(replacement.id, 7);
        assert_eq!(store.count(), Ok(1));
        assert_eq!(store.get(7), Ok(replacement));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = get_test_store();
        let first = store
            .insert(Transaction::build(1.0, "", "", TransactionType::Expense))
            .unwrap();
        store.delete(&first).unwrap();

        let second = store
            .insert(Transaction::build(1.0, "", "", TransactionType::Expense))
            .unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn ids_continue_after_explicit_id() {
        let store = get_test_store();
        store
            .insert(Transaction::build(1.0, "", "", TransactionType::Expense).id(Some(7)))
            .unwrap();

        let next = store
            .insert(Transaction::build(1.0, "", "", TransactionType::Expense))
            .unwrap();

        assert_eq!(next.id, 8);
    }

    #[test]
    fn update_replaces_whole_record() {
        let store = get_test_store();
        let original = store
            .insert(
                Transaction::build(50.0, "Lunch", "Food", TransactionType::Expense)
                    .id(Some(7))
                    .recurring(true),
            )
            .unwrap();
        let want = Transaction {
            amount: 75.0,
            description: "Dinner".to_owned(),
            category: "Eating out".to_owned(),
            date: original.date - Duration::days(1),
            transaction_type: TransactionType::Income,
            is_recurring: false,
            ..original
        };

        store.update(&want).unwrap();

        assert_eq!(store.get(7), Ok(want));
    }

    #[test]
    fn update_missing_transaction_is_noop() {
        let store = get_test_store();
        let stored = store
            .insert(Transaction::build(1.0, "", "", TransactionType::Expense))
            .unwrap();
        let missing = Transaction {
            id: stored.id + 1,
            ..stored.clone()
        };

        assert_eq!(store.update(&missing), Ok(()));
        assert_eq!(store.count(), Ok(1));
        assert_eq!(store.get(missing.id), Err(Error::NotFound));
    }

    #[test]
    fn delete_removes_transaction() {
        let store = get_test_store();
        let transaction = store
            .insert(Transaction::build(1.0, "", "", TransactionType::Expense))
            .unwrap();

        store.delete(&transaction).unwrap();

        assert_eq!(store.get(transaction.id), Err(Error::NotFound));
    }

    #[test]
    fn delete_missing_transaction_is_noop() {
        let store = get_test_store();
        let kept = store
            .insert(Transaction::build(1.0, "", "", TransactionType::Expense))
            .unwrap();
        let version = *store.changes().borrow();
        let never_inserted = Transaction {
            id: 42,
            ..kept.clone()
        };

        assert_eq!(store.delete(&never_inserted), Ok(()));
        assert_eq!(store.get_query(&TransactionQuery::default()), Ok(vec![kept]));
        assert_eq!(*store.changes().borrow(), version);
    }

    #[test]
    fn get_query_orders_most_recent_first() {
        let store = get_test_store();
        let base = datetime!(2025-01-01 0:00 UTC);
        for days in [3, 1, 4, 1, 5] {
            store
                .insert(
                    Transaction::build(days as f64, "", "", TransactionType::Expense)
                        .date(base + Duration::days(days)),
                )
                .unwrap();
        }

        let got = store
            .get_query(&TransactionQuery::most_recent_first())
            .unwrap();

        assert_eq!(got.len(), 5);
        for pair in got.windows(2) {
            assert!(
                pair[0].date >= pair[1].date,
                "{} should not come before {}",
                pair[0].date,
                pair[1].date
            );
        }
    }

    #[test]
    fn get_query_is_repeatable() {
        let store = get_test_store();
        let date = datetime!(2025-01-01 0:00 UTC);
        for amount in [1.0, 2.0, 3.0] {
            store
                .insert(Transaction::build(amount, "", "", TransactionType::Income).date(date))
                .unwrap();
        }
        let query = TransactionQuery::most_recent_first();

        assert_eq!(store.get_query(&query), store.get_query(&query));
    }

    #[test]
    fn get_query_filters_by_type_and_category() {
        let store = get_test_store();
        let salary = store
            .insert(Transaction::build(1000.0, "Salary", "Work", TransactionType::Income))
            .unwrap();
        let lunch = store
            .insert(Transaction::build(50.0, "Lunch", "Food", TransactionType::Expense))
            .unwrap();
        store
            .insert(Transaction::build(5.0, "Snack", "food", TransactionType::Expense))
            .unwrap();

        let income = store
            .get_query(&TransactionQuery {
                transaction_type: Some(TransactionType::Income),
                ..Default::default()
            })
            .unwrap();
        let food = store
            .get_query(&TransactionQuery {
                category: Some("Food".to_owned()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(income, vec![salary]);
        assert_eq!(food, vec![lunch], "category match should be case-sensitive");
    }

    #[test]
    fn get_query_limit() {
        let store = get_test_store();
        for amount in 1..=5 {
            store
                .insert(Transaction::build(amount as f64, "", "", TransactionType::Income))
                .unwrap();
        }

        let got = store
            .get_query(&TransactionQuery {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(got.len(), 2);
    }

    #[test]
    fn total_by_type_is_zero_when_empty() {
        let store = get_test_store();

        assert_eq!(store.total_by_type(TransactionType::Income), Ok(0.0));
        assert_eq!(store.total_by_type(TransactionType::Expense), Ok(0.0));
    }

    #[test]
    fn total_by_type_sums_matching_transactions() {
        let store = get_test_store();
        for (amount, transaction_type) in [
            (1000.0, TransactionType::Income),
            (200.0, TransactionType::Expense),
            (50.5, TransactionType::Expense),
        ] {
            store
                .insert(Transaction::build(amount, "", "", transaction_type))
                .unwrap();
        }

        assert_eq!(store.total_by_type(TransactionType::Income), Ok(1000.0));
        assert_eq!(store.total_by_type(TransactionType::Expense), Ok(250.5));
    }

    #[tokio::test]
    async fn live_query_sees_insert_and_delete() {
        let store = get_test_store();
        let mut all = store.query_all();
        all.wait_for(|state| state == &QueryState::Ready(vec![]))
            .await
            .expect("live query ended early");

        let transaction = store
            .insert(Transaction::build(50.0, "Lunch", "Food", TransactionType::Expense))
            .unwrap();
        let want = vec![transaction.clone()];
        all.wait_for(|state| state.value() == Some(&want))
            .await
            .expect("live query ended early");

        store.delete(&transaction).unwrap();
        let state = all
            .wait_for(|state| state.value().is_some_and(|all| all.is_empty()))
            .await;

        assert_eq!(state, Some(QueryState::Ready(vec![])));
    }

    #[tokio::test]
    async fn live_query_by_category_ignores_other_categories() {
        let store = get_test_store();
        let mut food = store.query_by_category("Food");
        let lunch = store
            .insert(Transaction::build(50.0, "Lunch", "Food", TransactionType::Expense))
            .unwrap();
        store
            .insert(Transaction::build(60.0, "Fuel", "Transport", TransactionType::Expense))
            .unwrap();

        let state = food
            .wait_for(|state| state.value().is_some_and(|food| !food.is_empty()))
            .await;

        assert_eq!(state, Some(QueryState::Ready(vec![lunch])));
    }

    #[tokio::test]
    async fn live_sum_tracks_updates() {
        let store = get_test_store();
        let mut expenses = store.sum_by_type(TransactionType::Expense);
        let lunch = store
            .insert(Transaction::build(50.0, "Lunch", "Food", TransactionType::Expense).id(Some(7)))
            .unwrap();
        expenses
            .wait_for(|state| state == &QueryState::Ready(50.0))
            .await
            .expect("live sum ended early");

        store
            .update(&Transaction {
                amount: 75.0,
                ..lunch
            })
            .unwrap();
        let state = expenses
            .wait_for(|state| state == &QueryState::Ready(75.0))
            .await;

        assert_eq!(state, Some(QueryState::Ready(75.0)));
        assert_eq!(store.get(7).map(|lunch| lunch.amount), Ok(75.0));
    }

    #[tokio::test]
    async fn live_query_by_type_reports_failure() {
        let store = get_test_store();
        store
            .insert(Transaction::build(1.0, "", "", TransactionType::Income))
            .unwrap();
        let mut income = store.query_by_type(TransactionType::Income);
        income
            .wait_for(|state| !state.is_pending())
            .await
            .expect("live query ended early");

        store
            .connection
            .lock()
            .unwrap()
            .execute("DROP TABLE transactions", ())
            .unwrap();
        store
            .insert(Transaction::build(1.0, "", "", TransactionType::Income))
            .expect_err("insert should fail without a table");
        // Failed inserts do not notify, so nudge the subscription manually.
        store.notify_changed();

        let state = income
            .wait_for(|state| state.error().is_some())
            .await
            .expect("failure should be delivered");
        assert!(matches!(state.error(), Some(Error::SqlError(_))));
        assert!(income.changed().await.is_none());
    }
}
