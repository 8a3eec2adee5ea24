// sqlcursor - fluent, lazily executed SELECT queries
// This is the library root that exposes the public API

pub mod database;
pub mod error;
pub mod executor;
pub mod instrument;
pub mod memory;
pub mod query;
pub mod storage;

// Re-export commonly used types for convenience
pub use database::Database;
pub use error::{Error, Result};
pub use executor::{ColumnDesc, Executor, RawResult};
pub use instrument::{Instrument, NoopInstrument, TracingInstrument};
pub use memory::MemoryDatabase;
pub use query::{CompiledQuery, Conditions, Cursor, Direction, Output, Shape};
pub use storage::{Column, DataType, Row, Schema, Value};
