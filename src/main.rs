// Main entry point for the sqlcursor CLI
// Loads tables from a JSON fixture and runs one cursor query against them

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use sqlcursor::{
    Conditions, Database, Direction, MemoryDatabase, Output, Row, Shape, TracingInstrument, Value,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// sqlcursor - build a SELECT fluently and run it over in-memory tables
#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON fixture with the tables to load
    #[arg(short, long)]
    data: PathBuf,

    /// Table to select from
    #[arg(short, long)]
    table: String,

    /// Filter as column=constraint, e.g. age=>=21 or name=A*; repeatable
    #[arg(short = 'w', long = "where", value_parser = parse_condition)]
    conditions: Vec<(String, Value)>,

    /// Comma-separated columns to select (default: all)
    #[arg(short, long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Order as column or column:asc|desc
    #[arg(short, long)]
    order: Option<String>,

    /// Result shape: rows, row, value, count or column:<name>
    #[arg(short, long, default_value = "rows")]
    shape: Shape,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Print the compiled SQL and arguments without running it
    #[arg(long)]
    explain: bool,

    /// Log every query and its execution time
    #[arg(long)]
    log_queries: bool,
}

fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=sqlcursor=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sqlcursor=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let fixture = fs::read_to_string(&args.data)
        .with_context(|| format!("reading fixture {}", args.data.display()))?;
    let memory = MemoryDatabase::from_fixture(&fixture)
        .with_context(|| format!("loading fixture {}", args.data.display()))?;
    tracing::debug!(tables = ?memory.list_tables(), "fixture loaded");

    let mut db = Database::new(memory);
    if args.log_queries {
        db = db.with_instrument(TracingInstrument);
    }

    let conditions: Conditions = args.conditions.into_iter().collect();
    let mut cursor = db
        .select(args.table.as_str())
        .filter_by(conditions)
        .project(args.fields)
        .shape(args.shape);
    if let Some(order) = &args.order {
        let (column, direction) = match order.split_once(':') {
            Some((column, direction)) => (column, Some(direction.parse::<Direction>()?)),
            None => (order.as_str(), None),
        };
        cursor = cursor.order_by(column, direction);
    }

    if args.explain {
        let compiled = cursor.compile();
        println!("{}", compiled);
        for (i, arg) in compiled.args.iter().enumerate() {
            println!("  ${} = {:?}", i + 1, arg);
        }
        return Ok(());
    }

    let output = cursor.fetch()?;
    let columns: Vec<String> = cursor
        .raw()
        .map(|raw| raw.columns.iter().map(|c| c.name.clone()).collect())
        .unwrap_or_default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", format_output(&output, &columns));
    }

    db.close();
    Ok(())
}

/// Parse `column=constraint`; the constraint is typed like a literal
fn parse_condition(s: &str) -> Result<(String, Value)> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected column=constraint, got '{}'", s))?;
    if column.is_empty() {
        return Err(anyhow!("missing column name in '{}'", s));
    }
    Ok((column.to_string(), Value::parse_literal(value)))
}

fn format_output(output: &Output, columns: &[String]) -> String {
    match output {
        Output::Rows(rows) => format_table(columns, rows),
        Output::Row(Some(row)) => format_table(columns, std::slice::from_ref(row)),
        Output::Row(None) => "No row found".to_string(),
        Output::Value(value) => value.to_string(),
        Output::Column(values) => values
            .iter()
            .map(|v| v.as_ref().map_or_else(|| "NULL".to_string(), Value::to_string))
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Count(count) => count.to_string(),
    }
}

/// Render rows as a box-drawn table
fn format_table(columns: &[String], rows: &[Row]) -> String {
    if rows.is_empty() {
        return "No rows found".to_string();
    }

    let cell = |row: &Row, name: &str| row.get(name).map(Value::to_string).unwrap_or_default();

    // Calculate column widths
    let widths: Vec<usize> = columns
        .iter()
        .map(|name| {
            rows.iter()
                .map(|row| cell(row, name).chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let border = |left: &str, mid: &str, right: &str| {
        let line: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, line.join(mid), right)
    };
    let line = |cells: Vec<String>| {
        let mut out = String::from("│");
        for (text, width) in cells.iter().zip(&widths) {
            out.push_str(&format!(" {:<width$} │", text, width = width));
        }
        out.push('\n');
        out
    };

    let mut result = border("┌", "┬", "┐");
    result.push_str(&line(columns.to_vec()));
    result.push_str(&border("├", "┼", "┤"));
    for row in rows {
        result.push_str(&line(columns.iter().map(|name| cell(row, name)).collect()));
    }
    result.push_str(&border("└", "┴", "┘"));
    result.push_str(&format!("\n{} row(s) returned", rows.len()));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_condition() {
        assert_eq!(
            parse_condition("age=>=21").unwrap(),
            ("age".to_string(), Value::from(">=21"))
        );
        assert_eq!(parse_condition("id=3").unwrap(), ("id".to_string(), Value::Integer(3)));
        assert!(parse_condition("age").is_err());
        assert!(parse_condition("=3").is_err());
    }

    #[test]
    fn test_format_table() {
        let rows = vec![Row::new().with("id", 1).with("name", "Alice")];
        let table = format_table(&["id".to_string(), "name".to_string()], &rows);
        assert!(table.contains("│ id │ name  │"));
        assert!(table.contains("│ 1  │ Alice │"));
        assert!(table.ends_with("1 row(s) returned"));
        assert_eq!(format_table(&[], &[]), "No rows found");
    }
}
