//! Application context
//!
//! Everything that used to be process-global (the backend client and the
//! query cache) lives in one explicitly constructed [`AppContext`]. Clones
//! share the same source, cache and notifier.

use crate::config::{ConfigError, DashboardConfig};
use nadi_query::{MutationRunner, Notifier, QueryClient, TracingNotifier};
use nadi_source::DataSource;
use std::fmt;
use std::sync::Arc;

/// Data source, query cache and notification sink of one dashboard
#[derive(Clone)]
pub struct AppContext {
    source: Arc<dyn DataSource>,
    client: QueryClient,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("source", &self.source.name())
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Assemble a context from its parts
    #[must_use]
    pub fn new(
        source: Arc<dyn DataSource>,
        client: QueryClient,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            client,
            notifier,
        }
    }

    /// Build the configured source and cache; notifications are logged
    ///
    /// # Errors
    /// [`ConfigError::Source`] if the data source cannot be built
    pub fn from_config(config: &DashboardConfig) -> Result<Self, ConfigError> {
        let source = config.source.build()?;
        tracing::info!(source = source.name(), "application context ready");
        Ok(Self::new(
            source,
            QueryClient::new(config.cache),
            Arc::new(TracingNotifier),
        ))
    }

    /// Replace the notification sink
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Data source
    #[inline]
    #[must_use]
    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    /// Query cache
    #[inline]
    #[must_use]
    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    /// Notification sink
    #[inline]
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Mutation adapter bound to this context
    #[must_use]
    pub fn runner(&self) -> MutationRunner {
        MutationRunner::new(self.client.clone(), Arc::clone(&self.notifier))
    }

    /// Tear down: drop every cached value and stop every observer
    pub fn shutdown(&self) {
        tracing::debug!(stats = ?self.client.stats(), "shutting down application context");
        self.client.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nadi_query::QueryKey;

    #[tokio::test]
    async fn clones_share_the_cache() {
        let context = AppContext::from_config(&DashboardConfig::default()).unwrap();
        let copy = context.clone();
        let key = QueryKey::new("staff").with("none");

        let first: u32 = context
            .client()
            .fetch(&key, || async { Ok::<_, std::io::Error>(7) })
            .await
            .unwrap();
        let second: u32 = copy
            .client()
            .fetch(&key, || async { Ok::<_, std::io::Error>(8) })
            .await
            .unwrap();

        assert_eq!((first, second), (7, 7));
        assert_eq!(context.source().name(), "memory");
    }

    #[tokio::test]
    async fn shutdown_empties_the_cache() {
        let context = AppContext::from_config(&DashboardConfig::default()).unwrap();
        let key = QueryKey::new("inventory").with("none");
        let _: u32 = context
            .client()
            .fetch(&key, || async { Ok::<_, std::io::Error>(1) })
            .await
            .unwrap();

        context.shutdown();

        let refetched: u32 = context
            .client()
            .fetch(&key, || async { Ok::<_, std::io::Error>(2) })
            .await
            .unwrap();
        assert_eq!(refetched, 2);
    }
}
