// Instrumentation hooks
// Called around every query a `Database` runs. Hooks are injected when the
// database is built; there is no global logger.

use crate::storage::Value;
use anyhow::Result;
use std::time::Duration;

pub trait Instrument: Send + Sync {
    /// Called with the compiled SQL and its arguments before execution
    fn before_query(&self, sql: &str, args: &[Value]) -> Result<()>;

    /// Called with the time the execution service took
    fn after_query(&self, elapsed: Duration) -> Result<()>;
}

/// Does nothing (the default)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstrument;

impl Instrument for NoopInstrument {
    fn before_query(&self, _sql: &str, _args: &[Value]) -> Result<()> {
        Ok(())
    }

    fn after_query(&self, _elapsed: Duration) -> Result<()> {
        Ok(())
    }
}

/// Emits each query and its execution time as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInstrument;

impl Instrument for TracingInstrument {
    fn before_query(&self, sql: &str, args: &[Value]) -> Result<()> {
        tracing::info!(sql, args = ?args, "executing query");
        Ok(())
    }

    fn after_query(&self, elapsed: Duration) -> Result<()> {
        tracing::info!(elapsed_ms = elapsed.as_secs_f64() * 1000.0, "query finished");
        Ok(())
    }
}
