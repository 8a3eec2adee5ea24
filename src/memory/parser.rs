// SQL Parser for the in-memory backend
// Converts the SELECT statements a cursor compiles into a structured query
// We use the sqlparser crate to handle the SQL grammar

use crate::storage::Value;
use anyhow::{anyhow, Result};
use sqlparser::ast::{
    BinaryOperator, Expr, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
    Value as SqlValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// SELECT <projection> FROM <table> [WHERE ...] [ORDER BY ...]
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table_name: String,
    /// None means `*`
    pub projection: Option<Vec<String>>,
    /// Conditions combined with AND
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderKey>,
}

/// A single `column <op> operand` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub operand: Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    Like,
    NotLike,
}

/// Right-hand side of a condition: a bind parameter or a literal
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `$n`, numbered from 1
    Placeholder(usize),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub column: String,
    pub descending: bool,
}

/// The query parser
pub struct SelectParser;

impl SelectParser {
    /// Parse a SQL string into a SelectQuery
    pub fn parse(sql: &str) -> Result<SelectQuery> {
        let dialect = GenericDialect {};
        let ast =
            Parser::parse_sql(&dialect, sql).map_err(|e| anyhow!("SQL parsing error: {}", e))?;

        // We only support single statements
        if ast.len() != 1 {
            return Err(anyhow!("Only single statements are supported"));
        }

        match &ast[0] {
            Statement::Query(query) => Self::parse_query(query),
            _ => Err(anyhow!("Only SELECT statements are supported")),
        }
    }

    fn parse_query(query: &Query) -> Result<SelectQuery> {
        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select,
            _ => return Err(anyhow!("Unsupported SELECT format")),
        };

        let table_name = Self::extract_table_name(select)?;
        let projection = Self::parse_projection(&select.projection)?;

        let mut filters = Vec::new();
        if let Some(selection) = &select.selection {
            Self::parse_where_clause(selection, &mut filters)?;
        }

        let mut order_by = Vec::new();
        if let Some(order) = &query.order_by {
            for item in &order.exprs {
                order_by.push(OrderKey {
                    column: Self::column_name(&item.expr)?,
                    descending: item.asc == Some(false),
                });
            }
        }

        Ok(SelectQuery {
            table_name,
            projection,
            filters,
            order_by,
        })
    }

    /// Helper: Extract table name from SELECT
    fn extract_table_name(select: &Select) -> Result<String> {
        if select.from.len() != 1 || !select.from[0].joins.is_empty() {
            return Err(anyhow!("SELECT must read from exactly one table"));
        }

        match &select.from[0].relation {
            TableFactor::Table { name, .. } => Ok(name
                .0
                .iter()
                .map(|i| i.value.clone())
                .collect::<Vec<_>>()
                .join(".")),
            _ => Err(anyhow!("Unsupported table reference")),
        }
    }

    fn parse_projection(items: &[SelectItem]) -> Result<Option<Vec<String>>> {
        if let [SelectItem::Wildcard(_)] = items {
            return Ok(None);
        }

        items
            .iter()
            .map(|item| match item {
                SelectItem::UnnamedExpr(expr) => Self::column_name(expr),
                _ => Err(anyhow!("Unsupported projection: {}", item)),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Helper: Parse WHERE clause
    /// Flattens a tree of AND-ed conditions into a list
    fn parse_where_clause(expr: &Expr, filters: &mut Vec<Filter>) -> Result<()> {
        match expr {
            Expr::Nested(inner) => Self::parse_where_clause(inner, filters),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                Self::parse_where_clause(left, filters)?;
                Self::parse_where_clause(right, filters)
            }
            Expr::BinaryOp { left, op, right } => {
                let op = match op {
                    BinaryOperator::Eq => FilterOp::Eq,
                    BinaryOperator::NotEq => FilterOp::NotEq,
                    BinaryOperator::Gt => FilterOp::Gt,
                    BinaryOperator::GtEq => FilterOp::GtEq,
                    BinaryOperator::Lt => FilterOp::Lt,
                    BinaryOperator::LtEq => FilterOp::LtEq,
                    other => return Err(anyhow!("Unsupported operator in WHERE clause: {}", other)),
                };
                filters.push(Filter {
                    column: Self::column_name(left)?,
                    op,
                    operand: Self::parse_operand(right)?,
                });
                Ok(())
            }
            Expr::Like {
                negated,
                expr,
                pattern,
                ..
            } => {
                filters.push(Filter {
                    column: Self::column_name(expr)?,
                    op: if *negated {
                        FilterOp::NotLike
                    } else {
                        FilterOp::Like
                    },
                    operand: Self::parse_operand(pattern)?,
                });
                Ok(())
            }
            _ => Err(anyhow!("Unsupported WHERE clause format: {}", expr)),
        }
    }

    fn column_name(expr: &Expr) -> Result<String> {
        match expr {
            Expr::Identifier(ident) => Ok(ident.value.clone()),
            _ => Err(anyhow!("Expected column name, got: {}", expr)),
        }
    }

    fn parse_operand(expr: &Expr) -> Result<Operand> {
        match expr {
            Expr::Value(SqlValue::Placeholder(p)) => p
                .strip_prefix('$')
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .map(Operand::Placeholder)
                .ok_or_else(|| anyhow!("Unsupported placeholder: {}", p)),
            other => Self::parse_value(other).map(Operand::Literal),
        }
    }

    /// Helper: Parse a single SQL literal
    fn parse_value(expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Value(SqlValue::Number(n, _)) => {
                if let Ok(i) = n.parse::<i64>() {
                    Ok(Value::Integer(i))
                } else {
                    Ok(Value::Float(n.parse()?))
                }
            }
            Expr::Value(SqlValue::SingleQuotedString(s))
            | Expr::Value(SqlValue::DoubleQuotedString(s)) => Ok(Value::Text(s.clone())),
            Expr::Value(SqlValue::Boolean(b)) => Ok(Value::Boolean(*b)),
            Expr::Value(SqlValue::Null) => Ok(Value::Null),
            _ => Err(anyhow!("Unsupported value expression: {}", expr)),
        }
    }
}
