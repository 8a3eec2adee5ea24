// Compiled query
// Snapshot of a cursor's state, rendered to SQL text + positional arguments

use crate::storage::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub table: String,
    pub select_columns: Vec<String>,
    pub predicate: Option<String>,
    pub args: Vec<Value>,
    pub order: Option<String>,
}

impl CompiledQuery {
    /// `SELECT <cols> FROM <table> [WHERE <predicate>] [ORDER BY <order>]`
    pub fn sql(&self) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.select_columns.join(", "),
            self.table
        );
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if let Some(order) = &self.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        sql
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_with_every_clause() {
        let compiled = CompiledQuery {
            table: "users".to_string(),
            select_columns: vec!["id".to_string(), "name".to_string()],
            predicate: Some("age >= $1".to_string()),
            args: vec![Value::from("21")],
            order: Some("name DESC".to_string()),
        };
        assert_eq!(
            compiled.sql(),
            "SELECT id, name FROM users WHERE age >= $1 ORDER BY name DESC"
        );
        assert_eq!(compiled.to_string(), compiled.sql());
    }

    #[test]
    fn test_sql_without_optional_clauses() {
        let compiled = CompiledQuery {
            table: "users".to_string(),
            select_columns: vec!["*".to_string()],
            predicate: None,
            args: Vec::new(),
            order: None,
        };
        assert_eq!(compiled.sql(), "SELECT * FROM users");
    }
}
