//! In-memory data source
//!
//! Holds tables of JSON rows behind a lock and evaluates selects with the
//! same operator semantics as the hosted backend. Used for demos, offline
//! runs and tests.

use crate::error::{RemoteError, SourceError};
use crate::select::{Filter, Row, Select};
use crate::source::{to_row, DataSource};
use async_trait::async_trait;
use nadi_model::{Record, Timestamp};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// Table store kept in process memory
#[derive(Debug, Default)]
pub struct InMemorySource {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl InMemorySource {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to `table`
    #[must_use]
    pub fn with_table(self, table: &str, rows: impl IntoIterator<Item = Row>) -> Self {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// Append typed records to their table
    ///
    /// # Errors
    /// [`RemoteError::Encode`] if a record does not serialise to an object
    pub fn with_records<R: Record>(self, records: &[R]) -> Result<Self, RemoteError> {
        let rows = records
            .iter()
            .map(|record| to_row(R::TABLE, record))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_table(R::TABLE, rows))
    }

    /// Build from a seed document `{ "<table>": [rows...] }`
    ///
    /// # Errors
    /// [`SourceError::SeedFormat`] if the document is not an object of row arrays
    pub fn from_seed(seed: Value) -> Result<Self, SourceError> {
        let Value::Object(tables) = seed else {
            return Err(SourceError::SeedFormat(
                "top level must be an object of tables".to_string(),
            ));
        };

        let mut store = HashMap::with_capacity(tables.len());
        for (table, rows) in tables {
            let Value::Array(rows) = rows else {
                return Err(SourceError::SeedFormat(format!("{table} must be an array")));
            };
            let rows = rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(row) => Ok(row),
                    other => Err(SourceError::SeedFormat(format!(
                        "{table} contains a non-object row: {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            store.insert(table, rows);
        }

        Ok(Self {
            tables: RwLock::new(store),
        })
    }

    /// Build from a JSON seed file
    ///
    /// # Errors
    /// [`SourceError::Seed`] if the file cannot be read, otherwise as
    /// [`InMemorySource::from_seed`]
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SourceError::Seed {
            path: path.to_path_buf(),
            source,
        })?;
        let seed = serde_json::from_str(&raw).map_err(|e| SourceError::SeedFormat(e.to_string()))?;
        Self::from_seed(seed)
    }

    /// Snapshot of a table
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// Number of rows in a table
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait]
impl DataSource for InMemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn select(&self, query: Select) -> Result<Vec<Row>, RemoteError> {
        let tables = self.tables.read();
        Ok(tables
            .get(query.table())
            .map(|rows| query.apply(rows))
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, RemoteError> {
        // Backend column defaults
        if row.get("id").map_or(true, Value::is_null) {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if row.get("created_at").map_or(true, Value::is_null) {
            row.insert("created_at".to_string(), Timestamp::now().into());
        }

        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();
        let id = row.get("id");
        if rows.iter().any(|existing| existing.get("id") == id) {
            return Err(RemoteError::Backend {
                status: 409,
                code: Some("23505".to_string()),
                message: format!("duplicate key value violates unique constraint \"{table}_pkey\""),
                details: None,
                hint: None,
            });
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, RemoteError> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| matches_all(row, filters)) {
            for (column, value) in &patch {
                row.insert(column.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, RemoteError> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let (removed, kept) = std::mem::take(rows)
            .into_iter()
            .partition(|row| matches_all(row, filters));
        *rows = kept;
        Ok(removed)
    }
}
