//! Error types for remote data access

use std::path::PathBuf;

/// Failure of a single remote call
///
/// The hosted client reports `{data, error}` pairs; here the error half is
/// this enum and the data half is the `Ok` value, so exactly one is present.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The backend answered with an error status
    #[error("backend rejected request ({status}): {message}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Backend error code (e.g. `23505`, `PGRST116`)
        code: Option<String>,
        /// Human readable message
        message: String,
        /// Extra detail supplied by the backend
        details: Option<String>,
        /// Suggested fix supplied by the backend
        hint: Option<String>,
    },

    /// The request never produced a response
    #[error("transport failure: {0}")]
    Transport(String),

    /// Rows came back but did not match the expected shape
    #[error("could not decode rows of {table}: {message}")]
    Decode {
        /// Table the rows came from
        table: String,
        /// Decoder message
        message: String,
    },

    /// A payload could not be turned into a row
    #[error("could not encode payload for {table}: {message}")]
    Encode {
        /// Target table
        table: String,
        /// Encoder message
        message: String,
    },

    /// A single-row operation matched nothing
    #[error("no matching row in {table}")]
    NotFound {
        /// Table that was addressed
        table: String,
    },
}

impl RemoteError {
    /// Build a backend error from just a status and message
    #[must_use]
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            code: None,
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    /// HTTP status, if the backend answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check for [`RemoteError::NotFound`]
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failure to construct a data source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Base URL does not parse
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No API key configured and none in the environment
    #[error("no api key configured and ${var} is not set")]
    MissingApiKey {
        /// Environment variable that was consulted
        var: String,
    },

    /// HTTP client could not be built
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Seed file could not be read
    #[error("failed to read seed file {path}: {source}")]
    Seed {
        /// Seed file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Seed document has the wrong shape
    #[error("invalid seed document: {0}")]
    SeedFormat(String),
}
