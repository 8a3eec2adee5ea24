// Query cursor
// A fluent SELECT builder that runs its query at most once
//
//   let adults = db
//       .select("users")
//       .filter_by(Conditions::new().with("age", ">=18"))
//       .project(["id", "name"])
//       .order_by("name", Some(Direction::Desc))
//       .fetch()?;
//
// Nothing touches the execution service until `fetch` is called.

use super::compiled::CompiledQuery;
use super::conditions::{translate, Conditions, Predicate};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::executor::{Executor, RawResult};
use crate::storage::{Row, Value};
use serde::Serialize;
use std::str::FromStr;

/// How a raw result set is turned into the value handed to the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Shape {
    /// Every row, in order
    #[default]
    Rows,
    /// The first row, if any
    Row,
    /// First declared column of the first row
    Value,
    /// One column from every row
    Column(String),
    /// The reported row count
    Count,
}

impl Shape {
    fn name(&self) -> &'static str {
        match self {
            Shape::Rows => "rows",
            Shape::Row => "row",
            Shape::Value => "value",
            Shape::Column(_) => "column",
            Shape::Count => "count",
        }
    }

    /// Reshape a raw result
    ///
    /// Only `Value` can fail: a result with no rows (or no columns) has no
    /// scalar to return. `Row` reports an empty result as `None`.
    pub fn apply(&self, raw: &RawResult) -> Result<Output> {
        let output = match self {
            Shape::Rows => Output::Rows(raw.rows.clone()),
            Shape::Row => Output::Row(raw.rows.first().cloned()),
            Shape::Value => {
                let row = raw.rows.first();
                let column = raw.columns.first();
                match (row, column) {
                    (Some(row), Some(column)) => {
                        Output::Value(row.get(&column.name).cloned().unwrap_or(Value::Null))
                    }
                    _ => return Err(Error::EmptyResult { shape: self.name() }),
                }
            }
            Shape::Column(name) => {
                Output::Column(raw.rows.iter().map(|row| row.get(name).cloned()).collect())
            }
            Shape::Count => Output::Count(raw.row_count),
        };
        Ok(output)
    }
}

/// Parses `rows`, `row`, `value`, `count` and `column:<name>`
impl FromStr for Shape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rows" => Ok(Shape::Rows),
            "row" => Ok(Shape::Row),
            "value" => Ok(Shape::Value),
            "count" => Ok(Shape::Count),
            _ => match s.split_once(':') {
                Some((kind, name)) if kind.eq_ignore_ascii_case("column") && !name.is_empty() => {
                    Ok(Shape::Column(name.to_string()))
                }
                _ => Err(Error::UnknownShape(s.to_string())),
            },
        }
    }
}

/// Sort direction appended to an ORDER BY column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Parses `asc`/`desc` in any case; anything else is rejected
impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(Error::UnknownDirection(s.to_string())),
        }
    }
}

/// The reshaped value a cursor delivers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Rows(Vec<Row>),
    Row(Option<Row>),
    Value(Value),
    Column(Vec<Option<Value>>),
    Count(u64),
}

impl Output {
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Output::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// `Some(None)` is a row shape over an empty result
    pub fn into_row(self) -> Option<Option<Row>> {
        match self {
            Output::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Output::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_column(self) -> Option<Vec<Option<Value>>> {
        match self {
            Output::Column(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_count(self) -> Option<u64> {
        match self {
            Output::Count(count) => Some(count),
            _ => None,
        }
    }
}

/// Accumulates SELECT intent for one table; see the module docs
pub struct Cursor<'db, E: Executor> {
    database: &'db Database<E>,
    table: String,
    columns: Vec<String>,
    predicate: Predicate,
    order: Option<String>,
    shape: Shape,
    state: State,
}

/// Where a cursor is in its single execution
enum State {
    Pending,
    /// The query ran; the shape in force at that moment is kept with the rows
    Fetched { raw: RawResult, shape: Shape },
    /// The query failed; only the fault's message is kept
    Failed(String),
}

impl<'db, E: Executor> Cursor<'db, E> {
    pub(crate) fn new(database: &'db Database<E>, table: impl Into<String>) -> Self {
        Self {
            database,
            table: table.into(),
            columns: vec!["*".to_string()],
            predicate: Predicate::default(),
            order: None,
            shape: Shape::default(),
            state: State::Pending,
        }
    }

    /// Filter rows; replaces any earlier filter
    pub fn filter_by(mut self, conditions: Conditions) -> Self {
        self.predicate = translate(&conditions);
        self
    }

    /// Select specific columns; an empty list means all columns
    pub fn project<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.columns = if columns.is_empty() {
            vec!["*".to_string()]
        } else {
            columns
        };
        self
    }

    /// Order by a column, optionally with a direction
    pub fn order_by(mut self, column: impl Into<String>, direction: Option<Direction>) -> Self {
        let mut order = column.into();
        if let Some(direction) = direction {
            order.push(' ');
            order.push_str(direction.keyword());
        }
        self.order = Some(order);
        self
    }

    /// Select the result shape; the last call wins
    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn as_rows(self) -> Self {
        self.shape(Shape::Rows)
    }

    pub fn as_row(self) -> Self {
        self.shape(Shape::Row)
    }

    pub fn as_value(self) -> Self {
        self.shape(Shape::Value)
    }

    pub fn as_column(self, name: impl Into<String>) -> Self {
        self.shape(Shape::Column(name.into()))
    }

    pub fn as_count(self) -> Self {
        self.shape(Shape::Count)
    }

    /// Snapshot the current state as SQL; no side effects
    pub fn compile(&self) -> CompiledQuery {
        let has_filter = !self.predicate.is_empty();
        CompiledQuery {
            table: self.table.clone(),
            select_columns: self.columns.clone(),
            predicate: has_filter.then(|| self.predicate.clause.clone()),
            args: if has_filter {
                self.predicate.args.clone()
            } else {
                Vec::new()
            },
            order: self.order.clone(),
        }
    }

    /// Run the query and return the shaped result
    ///
    /// The execution service is called at most once per cursor, whatever
    /// the outcome. Later calls reshape the stored rows with the shape used
    /// the first time, or report `Error::Consumed` if that execution failed.
    pub fn fetch(&mut self) -> Result<Output> {
        match &self.state {
            State::Fetched { raw, shape } => return shape.apply(raw),
            State::Failed(reason) => return Err(Error::Consumed(reason.clone())),
            State::Pending => {}
        }

        let compiled = self.compile();
        tracing::debug!(table = %self.table, sql = %compiled, "cursor executing");
        match self.database.query(&compiled.sql(), &compiled.args) {
            Ok(raw) => {
                // Shape is read now, not when it was configured
                let shape = self.shape.clone();
                let output = shape.apply(&raw);
                self.state = State::Fetched { raw, shape };
                output
            }
            Err(e) => {
                self.state = State::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// The raw result, once the query has run
    pub fn raw(&self) -> Option<&RawResult> {
        match &self.state {
            State::Fetched { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// True once `fetch` has called the execution service
    pub fn is_consumed(&self) -> bool {
        !matches!(self.state, State::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ColumnDesc;
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};

    /// Returns canned rows and counts calls
    struct Stub {
        result: RawResult,
        calls: Cell<usize>,
        last_sql: RefCell<String>,
        fail: Cell<bool>,
    }

    impl Stub {
        fn new(result: RawResult) -> Self {
            Self {
                result,
                calls: Cell::new(0),
                last_sql: RefCell::new(String::new()),
                fail: Cell::new(false),
            }
        }

        fn ids(ids: &[i64]) -> Self {
            let rows = ids
                .iter()
                .map(|id| Row::new().with("id", *id).with("name", format!("user{}", id)))
                .collect();
            Self::new(RawResult::new(
                vec![ColumnDesc::new("id"), ColumnDesc::new("name")],
                rows,
            ))
        }
    }

    impl Executor for Stub {
        fn execute(&self, sql: &str, _args: &[Value]) -> anyhow::Result<RawResult> {
            self.calls.set(self.calls.get() + 1);
            *self.last_sql.borrow_mut() = sql.to_string();
            if self.fail.get() {
                return Err(anyhow!("relation does not exist"));
            }
            Ok(self.result.clone())
        }
    }

    #[test]
    fn test_default_cursor_compiles_to_bare_select() {
        let db = Database::new(Stub::ids(&[]));
        let compiled = db.select("users").compile();
        assert_eq!(compiled.sql(), "SELECT * FROM users");
        assert!(compiled.args.is_empty());
    }

    #[test]
    fn test_builder_does_not_execute() {
        let db = Database::new(Stub::ids(&[1]));
        let cursor = db
            .select("users")
            .filter_by(Conditions::new().with("age", ">=21"))
            .as_count();
        assert!(!cursor.is_consumed());
        assert_eq!(db.executor().calls.get(), 0);
    }

    #[test]
    fn test_full_compile() {
        let db = Database::new(Stub::ids(&[]));
        let cursor = db
            .select("users")
            .filter_by(Conditions::new().with("age", ">=21").with("name", "a*b?"))
            .project(["id", "name"])
            .order_by("name", Some(Direction::Desc));

        let compiled = cursor.compile();
        assert_eq!(
            compiled.sql(),
            "SELECT id, name FROM users WHERE age >= $1 AND name LIKE $2 ORDER BY name DESC"
        );
        assert_eq!(compiled.args, vec![Value::from("21"), Value::from("a%b_")]);
        // Compiling twice without changes is stable
        assert_eq!(cursor.compile(), compiled);
    }

    #[test]
    fn test_filter_replaces_previous_filter() {
        let db = Database::new(Stub::ids(&[]));
        let compiled = db
            .select("users")
            .filter_by(Conditions::new().with("a", 1))
            .filter_by(Conditions::new().with("b", 2))
            .compile();
        assert_eq!(compiled.predicate.as_deref(), Some("b = $1"));
        assert_eq!(compiled.args, vec![Value::Integer(2)]);

        let cleared = db
            .select("users")
            .filter_by(Conditions::new().with("a", 1))
            .filter_by(Conditions::new())
            .compile();
        assert_eq!(cleared.sql(), "SELECT * FROM users");
    }

    #[test]
    fn test_order_direction_is_normalized() {
        let db = Database::new(Stub::ids(&[]));
        let direction = " Asc ".parse::<Direction>().unwrap();
        assert_eq!(
            db.select("t").order_by("a", Some(direction)).compile().order.as_deref(),
            Some("a ASC")
        );
        assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Desc);
        assert_eq!(
            db.select("t").order_by("a", None).compile().order.as_deref(),
            Some("a")
        );
    }

    #[test]
    fn test_order_direction_rejects_anything_else() {
        let err = "desc, (select 1)".parse::<Direction>().unwrap_err();
        assert!(matches!(err, Error::UnknownDirection(_)));
        assert!("".parse::<Direction>().is_err());
    }

    #[test]
    fn test_last_shape_selector_wins() {
        let db = Database::new(Stub::ids(&[1, 2]));
        let rows = db.select("users").as_count().as_rows().fetch().unwrap();
        assert_eq!(rows.into_rows().map(|rows| rows.len()), Some(2));
    }

    #[test]
    fn test_shape_is_fixed_at_first_fetch() {
        let db = Database::new(Stub::ids(&[1, 2]));
        let mut cursor = db.select("users").as_count();
        assert_eq!(cursor.fetch().unwrap(), Output::Count(2));

        // Reconfiguring after consumption does not change the delivered value
        let mut cursor = cursor.as_column("id");
        assert_eq!(cursor.fetch().unwrap(), Output::Count(2));
        assert_eq!(db.executor().calls.get(), 1);
    }

    #[test]
    fn test_rows_shape_is_default() {
        let db = Database::new(Stub::ids(&[1, 2]));
        let rows = db.select("users").fetch().unwrap().into_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("id"), Some(&Value::Integer(2)));
        assert_eq!(*db.executor().last_sql.borrow(), "SELECT * FROM users");
    }

    #[test]
    fn test_count_shape() {
        let db = Database::new(Stub::ids(&[1, 2, 3, 4, 5]));
        assert_eq!(db.select("users").as_count().fetch().unwrap(), Output::Count(5));

        let empty = Database::new(Stub::ids(&[]));
        assert_eq!(empty.select("users").as_count().fetch().unwrap(), Output::Count(0));
    }

    #[test]
    fn test_count_uses_reported_row_count() {
        let db = Database::new(Stub::new(RawResult::default().with_row_count(7)));
        assert_eq!(db.select("t").as_count().fetch().unwrap().into_count(), Some(7));
    }

    #[test]
    fn test_column_shape() {
        let db = Database::new(Stub::ids(&[1, 2]));
        let ids = db.select("users").as_column("id").fetch().unwrap();
        assert_eq!(
            ids.into_column().unwrap(),
            vec![Some(Value::Integer(1)), Some(Value::Integer(2))]
        );

        let missing = db.select("users").as_column("email").fetch().unwrap();
        assert_eq!(missing.into_column().unwrap(), vec![None, None]);

        let empty = Database::new(Stub::ids(&[]));
        let none = empty.select("users").as_column("id").fetch().unwrap();
        assert_eq!(none.into_column().unwrap(), Vec::<Option<Value>>::new());
    }

    #[test]
    fn test_row_shape() {
        let db = Database::new(Stub::ids(&[3, 4]));
        let row = db.select("users").as_row().fetch().unwrap().into_row().unwrap();
        assert_eq!(row.unwrap().get("id"), Some(&Value::Integer(3)));

        let empty = Database::new(Stub::ids(&[]));
        assert_eq!(empty.select("users").as_row().fetch().unwrap(), Output::Row(None));
    }

    #[test]
    fn test_value_shape_uses_first_declared_column() {
        let result = RawResult::new(
            vec![ColumnDesc::new("name"), ColumnDesc::new("id")],
            vec![Row::new().with("id", 9).with("name", "zed")],
        );
        let db = Database::new(Stub::new(result));
        assert_eq!(
            db.select("users").as_value().fetch().unwrap(),
            Output::Value(Value::from("zed"))
        );
    }

    #[test]
    fn test_value_shape_on_empty_result_fails() {
        let db = Database::new(Stub::ids(&[]));
        let mut cursor = db.select("users").as_value();
        let err = cursor.fetch().unwrap_err();
        assert!(matches!(err, Error::EmptyResult { shape: "value" }));

        // The query ran; asking again does not run it a second time
        assert!(cursor.is_consumed());
        assert!(cursor.fetch().is_err());
        assert_eq!(db.executor().calls.get(), 1);
    }

    #[test]
    fn test_second_fetch_does_not_reexecute() {
        let db = Database::new(Stub::ids(&[1, 2]));
        let mut cursor = db.select("users").as_count();

        let first = cursor.fetch().unwrap();
        let second = cursor.fetch().unwrap();
        assert_eq!(first, second);
        assert_eq!(db.executor().calls.get(), 1);
        assert_eq!(cursor.raw().map(|raw| raw.row_count), Some(2));
    }

    #[test]
    fn test_execution_fault_is_not_reissued() {
        let stub = Stub::ids(&[1]);
        stub.fail.set(true);
        let db = Database::new(stub);
        let mut cursor = db.select("missing").as_value();

        let err = cursor.fetch().unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
        assert_eq!(err.to_string(), "relation does not exist");
        assert!(cursor.is_consumed());
        assert!(cursor.raw().is_none());

        // Even once the executor recovers, the cursor does not run again
        db.executor().fail.set(false);
        let again = cursor.fetch().unwrap_err();
        assert!(matches!(again, Error::Consumed(ref reason) if reason == "relation does not exist"));
        assert_eq!(db.executor().calls.get(), 1);
    }

    #[test]
    fn test_shape_from_str() {
        assert_eq!("rows".parse::<Shape>().unwrap(), Shape::Rows);
        assert_eq!("COUNT".parse::<Shape>().unwrap(), Shape::Count);
        assert_eq!(
            "column:email".parse::<Shape>().unwrap(),
            Shape::Column("email".to_string())
        );
        assert!(matches!("column:".parse::<Shape>(), Err(Error::UnknownShape(_))));
        assert!(matches!("table".parse::<Shape>(), Err(Error::UnknownShape(_))));
    }
}
