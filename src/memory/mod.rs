// In-memory execution backend
// Parses the SELECT statements cursors compile and runs them over tables
// held in memory. Useful for demos, the CLI and tests.
pub mod executor;
pub mod parser;

pub use executor::{Fixture, MemoryDatabase, TableFixture};
pub use parser::{SelectParser, SelectQuery};
