//! Presentation adapter
//!
//! A [`QueryObserver`] subscribes to one key of a [`QueryClient`] and keeps
//! a [`QueryResult`] up to date: it fetches once on construction, again
//! whenever the key is invalidated, and sends one destructive toast for
//! every failed fetch. Previous data stays visible while reloading.
//!
//! The observer owns its background task. Dropping it (or calling
//! [`QueryObserver::cancel`]) aborts the task, so nothing is written after
//! disposal.

use crate::client::{QueryClient, QueryStatus};
use crate::error::QueryError;
use crate::key::QueryKey;
use crate::notify::{Notifier, Toast};
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// View state of one observed query
#[derive(Debug)]
pub struct QueryResult<T> {
    /// Lifecycle status
    pub status: QueryStatus,
    /// Last successfully fetched data
    pub data: Option<T>,
    /// Error of the last fetch, cleared on success
    pub error: Option<QueryError>,
    /// Number of settled fetches
    pub revision: u64,
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            revision: 0,
        }
    }
}

impl<T: Clone> Clone for QueryResult<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            revision: self.revision,
        }
    }
}

impl<T> QueryResult<T> {
    /// Check for a running fetch
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Check whether a fetch has settled and none is running
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self.status, QueryStatus::Success | QueryStatus::Error)
    }
}

/// Live subscription to one query key
#[derive(Debug)]
pub struct QueryObserver<T> {
    key: QueryKey,
    state: watch::Receiver<QueryResult<T>>,
    task: JoinHandle<()>,
}

impl<T> QueryObserver<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start observing `key`
    ///
    /// `failure_title` heads the toast sent when a fetch fails. Must be
    /// called inside a tokio runtime.
    pub fn spawn<E, F, Fut>(
        client: &QueryClient,
        notifier: Arc<dyn Notifier>,
        key: QueryKey,
        failure_title: impl Into<String>,
        fetcher: F,
    ) -> Self
    where
        E: StdError + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, state) = watch::channel(QueryResult::default());
        let task = tokio::spawn(observe(
            client.clone(),
            notifier,
            key.clone(),
            failure_title.into(),
            fetcher,
            tx,
        ));
        Self { key, state, task }
    }
}

impl<T: Clone> QueryObserver<T> {
    /// Observed key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn current(&self) -> QueryResult<T> {
        self.state.borrow().clone()
    }

    /// Wait for the first settled state
    pub async fn settled(&mut self) -> QueryResult<T> {
        self.settled_after(0).await
    }

    /// Wait for a settled state newer than `revision`
    ///
    /// Returns the last known state if the observer was cancelled.
    pub async fn settled_after(&mut self, revision: u64) -> QueryResult<T> {
        self.wait_for(|r| r.is_settled() && r.revision > revision)
            .await
    }

    /// Wait until `predicate` holds
    ///
    /// Returns the last known state if the observer was cancelled.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&QueryResult<T>) -> bool,
    ) -> QueryResult<T> {
        let waited = match self.state.wait_for(predicate).await {
            Ok(state) => Some(state.clone()),
            Err(_) => None,
        };
        waited.unwrap_or_else(|| self.state.borrow().clone())
    }

    /// Stop observing; no further updates are published
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Check whether the background task has stopped
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn observe<T, E, F, Fut>(
    client: QueryClient,
    notifier: Arc<dyn Notifier>,
    key: QueryKey,
    failure_title: String,
    fetcher: F,
    tx: watch::Sender<QueryResult<T>>,
) where
    T: Clone + Send + Sync + 'static,
    E: StdError + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let mut key_state = client.subscribe(&key);
    loop {
        let generation = key_state.borrow_and_update().generation;
        tx.send_modify(|r| r.status = QueryStatus::Loading);

        match client.fetch(&key, &fetcher).await {
            Ok(data) => tx.send_modify(|r| {
                r.status = QueryStatus::Success;
                r.data = Some(data);
                r.error = None;
                r.revision += 1;
            }),
            Err(err) => {
                tracing::warn!(%key, error = %err, "query failed");
                notifier.notify(Toast::destructive(failure_title.clone(), err.to_string()));
                tx.send_modify(|r| {
                    r.status = QueryStatus::Error;
                    r.error = Some(err);
                    r.revision += 1;
                });
            }
        }

        // Sleep until the key is invalidated. A cleared client closes the
        // channel right after its final bump, so check for that before
        // refetching.
        loop {
            if key_state.changed().await.is_err() || key_state.has_changed().is_err() {
                tracing::trace!(%key, "query client cleared, observer stopping");
                return;
            }
            if key_state.borrow_and_update().generation != generation {
                break;
            }
        }
    }
}
