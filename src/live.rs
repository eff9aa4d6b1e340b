//! Live queries: standing subscriptions that push a freshly computed result
//! every time the underlying transactions change.
//!
//! Each [Subscription] owns a background task. The task runs its query, sends
//! the result on a [watch] channel and then sleeps until the store's change
//! version moves on. Results are always recomputed in full. If several
//! changes land while a query is running, the next run sees all of them, so
//! subscribers only ever observe the latest state.

use std::sync::Arc;

use tokio::{
    sync::watch::{self, Ref},
    task::AbortHandle,
};

use crate::Error;

/// The latest result of a live query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// The query has not produced a result yet.
    Pending,
    /// The most recent result of the query.
    Ready(T),
    /// The query could not be served. The subscription has ended.
    Failed(Arc<Error>),
}

impl<T> QueryState<T> {
    /// The result of the query, if there is one.
    pub fn value(&self) -> Option<&T> {
        match self {
            QueryState::Ready(value) => Some(value),
            QueryState::Pending | QueryState::Failed(_) => None,
        }
    }

    /// The error that ended the subscription, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            QueryState::Failed(error) => Some(error),
            QueryState::Pending | QueryState::Ready(_) => None,
        }
    }

    /// Whether the query has yet to produce its first result.
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending)
    }
}

/// A handle to a live query.
///
/// Dropping the handle cancels the subscription.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: watch::Receiver<QueryState<T>>,
    task: AbortHandle,
}

impl<T> Subscription<T>
where
    T: Send + Sync + 'static,
{
    /// Start a live query that runs `query` now and again whenever the
    /// version published on `changes` advances.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub(crate) fn spawn<F>(mut changes: watch::Receiver<u64>, query: F) -> Self
    where
        F: Fn() -> Result<T, Error> + Send + 'static,
    {
        let (sender, receiver) = watch::channel(QueryState::Pending);

        let task = tokio::spawn(async move {
            loop {
                // Mark the version as seen before querying so that a change
                // committed mid-query triggers another run.
                let version = *changes.borrow_and_update();

                let state = match query() {
                    Ok(value) => QueryState::Ready(value),
                    Err(error) => {
                        tracing::error!("Live query failed at version {version}: {error}");
                        QueryState::Failed(Arc::new(error))
                    }
                };
                let failed = matches!(state, QueryState::Failed(_));

                if sender.send(state).is_err() || failed {
                    break;
                }

                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            tracing::debug!("Store dropped, ending live query");
                            break;
                        }
                    }
                    _ = sender.closed() => break,
                }
            }
        })
        .abort_handle();

        Self { receiver, task }
    }
}

impl<T> Subscription<T>
where
    T: Clone,
{
    /// The latest state of the query.
    pub fn current(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next result and return it.
    ///
    /// Returns `None` once the subscription has ended, either because it was
    /// cancelled or because the query failed and the failure has already
    /// been observed.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.receiver.changed().await.ok()?;

        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the state satisfies `predicate` and return it.
    ///
    /// Returns `None` if the subscription ends first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&QueryState<T>) -> bool,
    ) -> Option<QueryState<T>> {
        self.receiver
            .wait_for(predicate)
            .await
            .ok()
            .map(|state: Ref<'_, QueryState<T>>| (*state).clone())
    }
}

impl<T> Subscription<T> {
    /// A receiver that observes every state this subscription publishes.
    ///
    /// Receivers stop receiving updates once the subscription is cancelled.
    pub fn receiver(&self) -> watch::Receiver<QueryState<T>> {
        self.receiver.clone()
    }

    /// Whether the subscription is still delivering updates.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the query. No further updates are delivered.
    ///
    /// Does not wait for the background task to finish.
    pub fn cancel(self) {
        // Aborting happens in Drop.
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
