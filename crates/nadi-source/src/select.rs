//! Table-scoped select builder
//!
//! A [`Select`] names one table and composes filters, ordering and a row
//! limit by chaining:
//!
//! ```rust,ignore
//! let query = Select::from("nd_closures")
//!     .eq("site_id", site)
//!     .gte("start_date", from)
//!     .order_by("start_date", Direction::Ascending);
//! ```
//!
//! The same description drives both the in-memory fake (through
//! [`Select::apply`]) and the REST encoder, so both backends agree on the
//! meaning of every operator.

use nadi_model::Timestamp;
use serde_json::Value;
use std::cmp::Ordering;

/// One backend row: a JSON object keyed by column name
pub type Row = serde_json::Map<String, Value>;

/// Filter operator with its operand
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// `column = value`
    Eq(Value),
    /// `column <> value`
    Neq(Value),
    /// `column > value`
    Gt(Value),
    /// `column >= value`
    Gte(Value),
    /// `column < value`
    Lt(Value),
    /// `column <= value`
    Lte(Value),
    /// `column IN (values)`
    In(Vec<Value>),
    /// `column IS NULL`
    IsNull,
    /// `column IS NOT NULL`
    NotNull,
    /// Array column contains every value
    Contains(Vec<Value>),
}

/// A predicate on one column
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Column name
    pub column: String,
    /// Operator and operand
    pub op: FilterOp,
}

impl Filter {
    /// Build a filter
    #[inline]
    #[must_use]
    pub fn new(column: impl Into<String>, op: FilterOp) -> Self {
        Self {
            column: column.into(),
            op,
        }
    }

    /// Equality filter, the common case for id and scope columns
    #[inline]
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Eq(value.into()))
    }

    /// Evaluate against a row
    ///
    /// A missing column reads as `null`. Comparisons involving `null` are
    /// false, as in SQL.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        let cell = row.get(&self.column).unwrap_or(&Value::Null);
        match &self.op {
            FilterOp::Eq(v) => equals(cell, v),
            FilterOp::Neq(v) => !cell.is_null() && !v.is_null() && !equals(cell, v),
            FilterOp::Gt(v) => compare(cell, v) == Some(Ordering::Greater),
            FilterOp::Gte(v) => matches!(
                compare(cell, v),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt(v) => compare(cell, v) == Some(Ordering::Less),
            FilterOp::Lte(v) => {
                matches!(compare(cell, v), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOp::In(values) => values.iter().any(|v| equals(cell, v)),
            FilterOp::IsNull => cell.is_null(),
            FilterOp::NotNull => !cell.is_null(),
            FilterOp::Contains(values) => match cell {
                Value::Array(items) => values
                    .iter()
                    .all(|wanted| items.iter().any(|item| equals(item, wanted))),
                _ => false,
            },
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Smallest first, nulls last
    #[default]
    Ascending,
    /// Largest first, nulls first
    Descending,
}

impl Direction {
    /// Wire suffix (`asc` / `desc`)
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Ordering term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column name
    pub column: String,
    /// Direction
    pub direction: Direction,
}

/// Select statement against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: String,
    filters: Vec<Filter>,
    order: Vec<Order>,
    limit: Option<usize>,
}

impl Select {
    /// Select every row of `table`
    #[must_use]
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Add an arbitrary filter
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// `column = value`
    #[must_use]
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Eq(value.into())))
    }

    /// `column <> value`
    #[must_use]
    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Neq(value.into())))
    }

    /// `column > value`
    #[must_use]
    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Gt(value.into())))
    }

    /// `column >= value`
    #[must_use]
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Gte(value.into())))
    }

    /// `column < value`
    #[must_use]
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Lt(value.into())))
    }

    /// `column <= value`
    #[must_use]
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Lte(value.into())))
    }

    /// `column IN (values)`
    #[must_use]
    pub fn in_list<V: Into<Value>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(Filter::new(column, FilterOp::In(values)))
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(self, column: &str) -> Self {
        self.filter(Filter::new(column, FilterOp::IsNull))
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn not_null(self, column: &str) -> Self {
        self.filter(Filter::new(column, FilterOp::NotNull))
    }

    /// Array `column` contains all `values`
    #[must_use]
    pub fn contains<V: Into<Value>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(Filter::new(column, FilterOp::Contains(values)))
    }

    /// Append an ordering term
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Cap the number of rows
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Target table
    #[inline]
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Filters in insertion order
    #[inline]
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Ordering terms in priority order
    #[inline]
    #[must_use]
    pub fn ordering(&self) -> &[Order] {
        &self.order
    }

    /// Row limit
    #[inline]
    #[must_use]
    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Run this select over an in-memory table
    #[must_use]
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> Vec<Row> {
        let mut selected: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        if !self.order.is_empty() {
            selected.sort_by(|a, b| {
                self.order
                    .iter()
                    .map(|term| order_rows(a, b, term))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Compare two rows on one term; nulls sort as the largest value
fn order_rows(a: &Row, b: &Row, term: &Order) -> Ordering {
    let left = a.get(&term.column).unwrap_or(&Value::Null);
    let right = b.get(&term.column).unwrap_or(&Value::Null);
    let ordering = match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
    };
    match term.direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}

fn equals(cell: &Value, value: &Value) -> bool {
    match (cell, value) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Array(_) | Value::Object(_), _) => cell == value,
        _ => compare(cell, value) == Some(Ordering::Equal),
    }
}

/// Compare scalar cells the way the backend would
///
/// Numbers compare numerically (numeric strings included), timestamps
/// compare as instants whatever their textual form, other strings compare
/// lexically.
fn compare(cell: &Value, value: &Value) -> Option<Ordering> {
    match (cell, value) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.parse::<f64>().ok()?),
        (Value::String(a), Value::Number(b)) => a.parse::<f64>().ok()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => {
            if a == b {
                return Some(Ordering::Equal);
            }
            match (a.parse::<Timestamp>(), b.parse::<Timestamp>()) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
