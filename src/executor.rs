// Execution service seam
// The cursor never talks to a database directly; it hands compiled SQL and
// positional arguments to an `Executor` and gets back a `RawResult`.

use crate::storage::{Row, Value};
use anyhow::Result;
use serde::Serialize;

/// Describes one column of a result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDesc {
    pub name: String,
}

impl ColumnDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Result set as reported by the execution service
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawResult {
    pub rows: Vec<Row>,
    pub columns: Vec<ColumnDesc>,
    pub row_count: u64,
}

impl RawResult {
    /// Build a result whose row count is the number of rows
    pub fn new(columns: Vec<ColumnDesc>, rows: Vec<Row>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            rows,
            columns,
            row_count,
        }
    }

    /// Override the reported row count (drivers may report it separately)
    pub fn with_row_count(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }
}

/// Anything that can run a parameterized SELECT
///
/// Faults are reported as `anyhow::Error` and surface to the cursor's
/// consumer unchanged.
pub trait Executor {
    fn execute(&self, sql: &str, args: &[Value]) -> Result<RawResult>;

    /// Release underlying resources; called by `Database::close`
    fn close(&self) {}
}
