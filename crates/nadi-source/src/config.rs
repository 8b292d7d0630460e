//! Data source selection
//!
//! The choice between the hosted backend and the in-memory fake is made
//! here and nowhere else.

use crate::error::SourceError;
use crate::memory::InMemorySource;
use crate::rest::RestSource;
use crate::source::DataSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default environment variable holding the backend API key
pub const DEFAULT_API_KEY_ENV: &str = "NADI_API_KEY";

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

/// Which data source to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// In-memory tables, optionally seeded from a JSON file
    Memory {
        /// Seed document `{ "<table>": [rows...] }`
        #[serde(default)]
        seed: Option<PathBuf>,
    },
    /// Hosted PostgREST backend
    Rest {
        /// Project URL, e.g. `https://xyz.supabase.co`
        url: String,
        /// API key; falls back to `api_key_env`
        #[serde(default, skip_serializing)]
        api_key: Option<String>,
        /// Environment variable consulted when `api_key` is absent
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        /// Per-request timeout
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Memory { seed: None }
    }
}

impl SourceConfig {
    /// Short name of the selected backend
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory { .. } => "memory",
            Self::Rest { .. } => "rest",
        }
    }

    /// Construct the configured source
    ///
    /// # Errors
    /// Seed read/format errors, an unparsable URL, or a missing API key
    pub fn build(&self) -> Result<Arc<dyn DataSource>, SourceError> {
        match self {
            Self::Memory { seed: None } => Ok(Arc::new(InMemorySource::new())),
            Self::Memory { seed: Some(path) } => {
                tracing::info!(seed = %path.display(), "loading in-memory tables");
                Ok(Arc::new(InMemorySource::from_path(path)?))
            }
            Self::Rest {
                url,
                api_key,
                api_key_env,
                timeout_secs,
            } => {
                let key = match api_key {
                    Some(key) => key.clone(),
                    None => std::env::var(api_key_env).map_err(|_| SourceError::MissingApiKey {
                        var: api_key_env.clone(),
                    })?,
                };
                let timeout = timeout_secs.map(Duration::from_secs);
                tracing::info!(%url, ?timeout, "connecting to rest backend");
                Ok(Arc::new(RestSource::with_timeout(url, key, timeout)?))
            }
        }
    }
}
