// Database handle
// Owns the execution service and the instrumentation hook, runs raw queries
// and hands out cursors

use crate::error::Result;
use crate::executor::{Executor, RawResult};
use crate::instrument::{Instrument, NoopInstrument};
use crate::query::Cursor;
use crate::storage::Value;
use std::time::Instant;

pub struct Database<E: Executor> {
    executor: E,
    instrument: Box<dyn Instrument>,
}

impl<E: Executor> Database<E> {
    /// Wrap an execution service; queries are not instrumented
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            instrument: Box::new(NoopInstrument),
        }
    }

    /// Replace the instrumentation hook
    pub fn with_instrument(mut self, instrument: impl Instrument + 'static) -> Self {
        self.instrument = Box::new(instrument);
        self
    }

    /// Run a SQL statement with positional arguments
    ///
    /// Hook errors are logged and otherwise ignored; execution faults are
    /// returned unchanged as `Error::Execution`.
    pub fn query(&self, sql: &str, args: &[Value]) -> Result<RawResult> {
        if let Err(e) = self.instrument.before_query(sql, args) {
            tracing::warn!(error = %e, "instrumentation hook failed before query");
        }

        let started = Instant::now();
        let result = self.executor.execute(sql, args);

        if let Err(e) = self.instrument.after_query(started.elapsed()) {
            tracing::warn!(error = %e, "instrumentation hook failed after query");
        }

        Ok(result?)
    }

    /// Start a SELECT on a table
    pub fn select(&self, table: impl Into<String>) -> Cursor<'_, E> {
        Cursor::new(self, table)
    }

    /// Access the execution service
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Close the execution service and drop the handle
    pub fn close(self) {
        self.executor.close();
    }
}
