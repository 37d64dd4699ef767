//! The query execution port.
//!
//! The core hands a finished query string to an executor and receives the
//! rows back as ordered column → value records. Everything above this trait
//! is store-agnostic.

use async_trait::async_trait;

use offshore_core::Value;

use crate::client::GraphError;

/// Submit a query string, receive its rows or a failure.
///
/// Implementations never retry; a failed execution is surfaced as-is.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> Result<Vec<Record>, GraphError>;
}

/// One result row, keyed by the aliases of the query's `RETURN` clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: &str, value: impl Into<Value>) {
        self.columns.push((column.to_string(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn get_int(&self, column: &str) -> Result<i64, GraphError> {
        match self.get(column) {
            Some(Value::Int(i)) => Ok(*i),
            Some(other) => Err(GraphError::Structural(format!(
                "column '{column}' is not an integer: {other}"
            ))),
            None => Err(GraphError::Structural(format!("missing column '{column}'"))),
        }
    }

    pub fn get_str(&self, column: &str) -> Result<&str, GraphError> {
        match self.get(column) {
            Some(Value::Str(s)) => Ok(s),
            Some(other) => Err(GraphError::Structural(format!(
                "column '{column}' is not a string: {other}"
            ))),
            None => Err(GraphError::Structural(format!("missing column '{column}'"))),
        }
    }

    /// Non-negative integer column narrowed to a count.
    pub fn get_count(&self, column: &str) -> Result<u32, GraphError> {
        let n = self.get_int(column)?;
        u32::try_from(n).map_err(|_| {
            GraphError::Structural(format!("column '{column}' is not a valid count: {n}"))
        })
    }
}

/// Unwrap the single record a count query must return.
pub fn single(records: Vec<Record>) -> Result<Record, GraphError> {
    let n = records.len();
    let mut records = records.into_iter();
    match (records.next(), n) {
        (Some(record), 1) => Ok(record),
        _ => Err(GraphError::Structural(format!(
            "expected exactly one record, got {n}"
        ))),
    }
}
