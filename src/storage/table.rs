// Table implementation
// A table combines a schema with rows kept in insertion order

use super::{Row, Schema, Value};
use anyhow::{anyhow, Result};

/// Represents an in-memory table
pub struct Table {
    /// The name of the table
    pub name: String,
    /// The schema (column definitions)
    pub schema: Schema,
    /// Stored rows, one value per schema column
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a new, empty table
    pub fn new(name: String, schema: Schema) -> Self {
        Self {
            name,
            schema,
            rows: Vec::new(),
        }
    }

    /// Insert a row into the table
    /// Returns the position of the inserted row
    pub fn insert(&mut self, values: Vec<Value>) -> Result<usize> {
        // Validate the row matches the schema
        if values.len() != self.schema.columns.len() {
            return Err(anyhow!(
                "Expected {} values, got {}",
                self.schema.columns.len(),
                values.len()
            ));
        }

        for (column, value) in self.schema.columns.iter().zip(&values) {
            if value.is_null() && !column.nullable {
                return Err(anyhow!("Column '{}' does not accept NULL", column.name));
            }
            if !value.fits(&column.data_type) {
                return Err(anyhow!(
                    "Column '{}' expects {:?}, got '{}'",
                    column.name,
                    column.data_type,
                    value
                ));
            }
        }

        self.rows.push(values);
        Ok(self.rows.len() - 1)
    }

    /// Full table scan, rows keyed by column name
    pub fn scan(&self) -> impl Iterator<Item = Row> + '_ {
        self.rows.iter().map(move |values| {
            self.schema
                .columns
                .iter()
                .zip(values)
                .map(|(column, value)| (column.name.clone(), value.clone()))
                .collect::<Row>()
        })
    }

    /// Get the number of rows in the table
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the schema of the table
    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Column, DataType};

    fn users() -> Table {
        Table::new(
            "users".to_string(),
            Schema::new(vec![
                Column::new("id", DataType::Integer).not_null(),
                Column::new("name", DataType::Text),
            ]),
        )
    }

    #[test]
    fn test_insert_and_scan() {
        let mut table = users();
        table.insert(vec![Value::Integer(1), Value::from("Alice")]).unwrap();
        table.insert(vec![Value::Integer(2), Value::Null]).unwrap();

        let rows: Vec<Row> = table.scan().collect();
        assert_eq!(table.row_count(), 2);
        assert_eq!(rows[0].get("name"), Some(&Value::from("Alice")));
        assert_eq!(rows[1].get("id"), Some(&Value::Integer(2)));
        assert_eq!(rows[1].get("name"), Some(&Value::Null));
    }

    #[test]
    fn test_insert_rejects_bad_rows() {
        let mut table = users();
        assert!(table.insert(vec![Value::Integer(1)]).is_err());
        assert!(table.insert(vec![Value::Null, Value::from("x")]).is_err());
        assert!(table.insert(vec![Value::from("1"), Value::from("x")]).is_err());
        assert_eq!(table.row_count(), 0);
    }
}
