// Query module - condition translation, compiled queries and the cursor
pub mod compiled;
pub mod conditions;
pub mod cursor;

pub use compiled::CompiledQuery;
pub use conditions::{translate, Conditions, Constraint, Predicate};
pub use cursor::{Cursor, Direction, Output, Shape};
