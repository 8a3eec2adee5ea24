// Query Executor for the in-memory backend
// Runs parsed SELECT queries against in-memory tables

use super::parser::{Filter, FilterOp, Operand, SelectParser, SelectQuery};
use crate::executor::{ColumnDesc, Executor, RawResult};
use crate::storage::{table::Table, Column, Row, Schema, Value};
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// An in-memory database: tables by name, queried with SQL
#[derive(Default)]
pub struct MemoryDatabase {
    tables: HashMap<String, Table>,
}

/// JSON fixture layout used to seed a MemoryDatabase
///
/// ```json
/// { "tables": [ { "name": "users",
///                 "columns": [ { "name": "id", "data_type": "Integer" } ],
///                 "rows": [ [1] ] } ] }
/// ```
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub tables: Vec<TableFixture>,
}

#[derive(Debug, Deserialize)]
pub struct TableFixture {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl MemoryDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a database from a JSON fixture
    pub fn from_fixture(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json)?;
        let mut db = Self::new();
        for table in fixture.tables {
            db.create_table(&table.name, table.columns)?;
            for values in table.rows {
                db.insert(&table.name, values)?;
            }
        }
        Ok(db)
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        // Check if table already exists
        if self.tables.contains_key(name) {
            return Err(anyhow!("Table '{}' already exists", name));
        }
        let table = Table::new(name.to_string(), Schema::new(columns));
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    pub fn insert(&mut self, table_name: &str, values: Vec<Value>) -> Result<()> {
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or_else(|| anyhow!("Table '{}' not found", table_name))?;
        table.insert(values)?;
        Ok(())
    }

    /// Get a reference to a table
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// List all tables, sorted by name
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run a parsed query with bound arguments
    pub fn run(&self, query: &SelectQuery, args: &[Value]) -> Result<RawResult> {
        let table = self
            .tables
            .get(&query.table_name)
            .ok_or_else(|| anyhow!("Table '{}' not found", query.table_name))?;
        let schema = table.get_schema();

        // Validate every referenced column up front, even on empty tables
        let referenced = query
            .filters
            .iter()
            .map(|f| &f.column)
            .chain(query.order_by.iter().map(|o| &o.column))
            .chain(query.projection.iter().flatten());
        for column in referenced {
            if schema.get_column_index(column).is_none() {
                return Err(anyhow!("Column not found: {}", column));
            }
        }

        let bound = query
            .filters
            .iter()
            .map(|filter| bind(&filter.operand, args).map(|value| (filter, value)))
            .collect::<Result<Vec<_>>>()?;

        let mut rows: Vec<Row> = table
            .scan()
            .filter(|row| bound.iter().all(|(filter, value)| matches_filter(row, filter, value)))
            .collect();

        // Stable sort, applied last key first
        for key in query.order_by.iter().rev() {
            rows.sort_by(|a, b| {
                let ordering = compare_for_sort(a.get(&key.column), b.get(&key.column));
                if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let columns = match &query.projection {
            Some(columns) => columns.clone(),
            None => schema.column_names(),
        };

        let rows = rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|name| (name.clone(), row.get(name).cloned().unwrap_or(Value::Null)))
                    .collect::<Row>()
            })
            .collect();

        Ok(RawResult::new(
            columns.into_iter().map(ColumnDesc::new).collect(),
            rows,
        ))
    }
}

impl Executor for MemoryDatabase {
    fn execute(&self, sql: &str, args: &[Value]) -> Result<RawResult> {
        let query = SelectParser::parse(sql)?;
        self.run(&query, args)
    }
}

fn bind(operand: &Operand, args: &[Value]) -> Result<Value> {
    match operand {
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Placeholder(n) => args
            .get(n - 1)
            .cloned()
            .ok_or_else(|| anyhow!("No argument bound for ${} ({} given)", n, args.len())),
    }
}

fn matches_filter(row: &Row, filter: &Filter, value: &Value) -> bool {
    let Some(actual) = row.get(&filter.column) else {
        return false;
    };

    // NULL never matches anything, as in SQL
    if actual.is_null() || value.is_null() {
        return false;
    }

    if let FilterOp::Like | FilterOp::NotLike = filter.op {
        let (Some(text), Some(pattern)) = (text_of(actual), value.as_text()) else {
            return false;
        };
        return like(&text, pattern) == (filter.op == FilterOp::Like);
    }

    let Some(ordering) = actual.compare(value) else {
        return false;
    };
    match filter.op {
        FilterOp::Eq => ordering == Ordering::Equal,
        FilterOp::NotEq => ordering != Ordering::Equal,
        FilterOp::Gt => ordering == Ordering::Greater,
        FilterOp::GtEq => ordering != Ordering::Less,
        FilterOp::Lt => ordering == Ordering::Less,
        FilterOp::LtEq => ordering != Ordering::Greater,
        FilterOp::Like | FilterOp::NotLike => false,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// NULLs sort first; incomparable values keep their order
fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

/// SQL LIKE: `%` matches any sequence, `_` exactly one character
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // Greedy matcher with backtracking to the last `%`
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, t));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}
