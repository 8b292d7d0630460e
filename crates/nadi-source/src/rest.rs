//! PostgREST-backed data source
//!
//! Speaks the dialect of the hosted backend:
//!
//! - `GET|POST|PATCH|DELETE {base}/rest/v1/{table}`
//! - filters as `column=op.value` query pairs, `order=col.asc,col2.desc`,
//!   `limit=n`
//! - `apikey` and bearer headers on every request
//! - `Prefer: return=representation` on writes so the stored rows come back
//!
//! Error responses are decoded from the backend's JSON error body. No
//! retries are attempted.

use crate::error::{RemoteError, SourceError};
use crate::select::{Filter, FilterOp, Row, Select};
use crate::source::DataSource;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Data source talking to a PostgREST endpoint
#[derive(Clone)]
pub struct RestSource {
    client: Client,
    base: Url,
    api_key: String,
}

impl fmt::Debug for RestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestSource")
            .field("base", &self.base.as_str())
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl RestSource {
    /// Connect to `base_url` without a request timeout
    ///
    /// # Errors
    /// [`SourceError::InvalidUrl`] or [`SourceError::Client`]
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, SourceError> {
        Self::with_timeout(base_url, api_key, None)
    }

    /// Connect to `base_url` with an optional per-request timeout
    ///
    /// # Errors
    /// [`SourceError::InvalidUrl`] or [`SourceError::Client`]
    pub fn with_timeout(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, SourceError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base,
            api_key: api_key.into(),
        })
    }

    /// Base URL requests are resolved against
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, RemoteError> {
        let url = self
            .base
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key))
    }

    async fn send(&self, table: &str, request: RequestBuilder) -> Result<Vec<Row>, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        read_rows(table, response).await
    }
}

#[async_trait]
impl DataSource for RestSource {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn select(&self, query: Select) -> Result<Vec<Row>, RemoteError> {
        let request = self
            .request(Method::GET, query.table())?
            .query(&select_pairs(&query));
        tracing::trace!(table = query.table(), "GET");
        self.send(query.table(), request).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, RemoteError> {
        let request = self
            .request(Method::POST, table)?
            .header("Prefer", "return=representation")
            .json(&row);
        tracing::trace!(table, "POST");
        self.send(table, request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::Decode {
                table: table.to_string(),
                message: "insert returned no representation".to_string(),
            })
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, RemoteError> {
        let request = self
            .request(Method::PATCH, table)?
            .header("Prefer", "return=representation")
            .query(&filter_pairs(filters))
            .json(&patch);
        tracing::trace!(table, "PATCH");
        self.send(table, request).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, RemoteError> {
        let request = self
            .request(Method::DELETE, table)?
            .header("Prefer", "return=representation")
            .query(&filter_pairs(filters));
        tracing::trace!(table, "DELETE");
        self.send(table, request).await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

async fn read_rows(table: &str, response: Response) -> Result<Vec<Row>, RemoteError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RemoteError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(decode_error(status.as_u16(), &body));
    }
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&body).map_err(|e| RemoteError::Decode {
        table: table.to_string(),
        message: e.to_string(),
    })
}

fn decode_error(status: u16, body: &str) -> RemoteError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => RemoteError::Backend {
            status,
            code: err.code,
            message: err.message,
            details: err.details,
            hint: err.hint,
        },
        Err(_) => RemoteError::backend(status, body.trim()),
    }
}

/// Query pairs for a select
pub(crate) fn select_pairs(query: &Select) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), "*".to_string())];
    pairs.extend(filter_pairs(query.filters()));

    if !query.ordering().is_empty() {
        let order = query
            .ordering()
            .iter()
            .map(|term| format!("{}.{}", term.column, term.direction.as_str()))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("order".to_string(), order));
    }
    if let Some(limit) = query.row_limit() {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

/// Query pairs for a filter list
pub(crate) fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| (filter.column.clone(), encode_op(&filter.op)))
        .collect()
}

fn encode_op(op: &FilterOp) -> String {
    match op {
        FilterOp::Eq(v) => format!("eq.{}", scalar(v)),
        FilterOp::Neq(v) => format!("neq.{}", scalar(v)),
        FilterOp::Gt(v) => format!("gt.{}", scalar(v)),
        FilterOp::Gte(v) => format!("gte.{}", scalar(v)),
        FilterOp::Lt(v) => format!("lt.{}", scalar(v)),
        FilterOp::Lte(v) => format!("lte.{}", scalar(v)),
        FilterOp::In(values) => format!("in.({})", list(values)),
        FilterOp::IsNull => "is.null".to_string(),
        FilterOp::NotNull => "not.is.null".to_string(),
        FilterOp::Contains(values) => format!("cs.{{{}}}", list(values)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Comma separated list; items containing reserved characters are quoted
fn list(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| {
            let raw = scalar(v);
            if raw.contains([',', '(', ')', '{', '}', '"', ':']) {
                format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                raw
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
