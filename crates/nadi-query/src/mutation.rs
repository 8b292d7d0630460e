//! Mutation-side adapter

use crate::client::QueryClient;
use crate::key::QueryKey;
use crate::notify::{Notifier, Toast};
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;

/// Runs mutations and reconciles the cache afterwards
///
/// On success the keys declared by the caller are invalidated and a
/// success toast is sent. On failure the error is logged, one destructive
/// toast is sent and the error is returned unchanged.
#[derive(Clone)]
pub struct MutationRunner {
    client: QueryClient,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for MutationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationRunner")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl MutationRunner {
    /// Create a runner
    #[must_use]
    pub fn new(client: QueryClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, notifier }
    }

    /// Run `mutation`, then invalidate the keys `invalidates` derives from
    /// its result
    ///
    /// # Errors
    /// The mutation's own error
    pub async fn run<T, E, Fut, K>(
        &self,
        success: &str,
        mutation: Fut,
        invalidates: K,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: StdError,
        K: FnOnce(&T) -> Vec<QueryKey>,
    {
        match mutation.await {
            Ok(value) => {
                for key in invalidates(&value) {
                    self.client.invalidate(&key).await;
                }
                self.notifier.notify(Toast::success("Success", success));
                Ok(value)
            }
            Err(err) => {
                tracing::error!(error = %err, "mutation failed");
                self.notifier.notify(Toast::destructive("Error", err.to_string()));
                Err(err)
            }
        }
    }
}
