//! Dashboard configuration
//!
//! Loaded from a TOML file; every section has defaults so an empty file (or
//! no file) yields an in-memory dashboard. Environment variables override
//! the file:
//!
//! | variable | effect |
//! |----------|--------|
//! | `NADI_SOURCE_URL` | use the REST source at this URL |
//! | `NADI_API_KEY` | API key of the REST source |
//! | `NADI_LOG` | log filter directives |
//!
//! ```toml
//! [source]
//! kind = "rest"
//! url = "https://xyz.supabase.co"
//! timeout_secs = 10
//!
//! [cache]
//! max_capacity = 500
//!
//! [logging]
//! filter = "nadi=debug"
//! json = true
//!
//! [session]
//! user_id = "6f1c..."
//! user_type = "super_admin"
//! ```

use nadi_model::Session;
use nadi_query::CacheConfig;
use nadi_source::config::DEFAULT_API_KEY_ENV;
use nadi_source::{SourceConfig, SourceError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable selecting the REST source
pub const SOURCE_URL_ENV: &str = "NADI_SOURCE_URL";

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "NADI_LOG";

/// Configuration loading failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Config path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`DashboardConfig`]
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config path
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// The configured data source could not be built
    #[error(transparent)]
    Source(#[from] SourceError),

    /// An operation needs a signed-in session but none is configured
    #[error("no session configured")]
    NoSession,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Complete dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Data source selection
    pub source: SourceConfig,
    /// Query cache sizing
    pub cache: CacheConfig,
    /// Log output
    pub logging: LoggingConfig,
    /// Signed-in user
    pub session: Option<Session>,
}

impl DashboardConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    /// [`ConfigError::Parse`] with an empty path
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Read`] or [`ConfigError::Parse`]
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, otherwise defaults, then apply the process
    /// environment
    ///
    /// # Errors
    /// See [`DashboardConfig::from_path`]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok());
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(SOURCE_URL_ENV) {
            match &mut self.source {
                SourceConfig::Rest { url: current, .. } => *current = url,
                SourceConfig::Memory { .. } => {
                    self.source = SourceConfig::Rest {
                        url,
                        api_key: None,
                        api_key_env: DEFAULT_API_KEY_ENV.to_string(),
                        timeout_secs: None,
                    };
                }
            }
        }
        if let SourceConfig::Rest { api_key, .. } = &mut self.source {
            if let Some(key) = lookup(DEFAULT_API_KEY_ENV) {
                *api_key = Some(key);
            }
        }
        if let Some(filter) = lookup(LOG_ENV) {
            self.logging.filter = filter;
        }
    }

    /// Configured session
    ///
    /// # Errors
    /// [`ConfigError::NoSession`]
    pub fn session(&self) -> Result<Session, ConfigError> {
        self.session.ok_or(ConfigError::NoSession)
    }
}
