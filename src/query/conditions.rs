// Condition translator
// Turns a column -> constraint mapping into a parameterized WHERE predicate
//
// Text constraints carry their own operator:
//   ">=21"  -> age >= $1   (argument "21")
//   "a*b?"  -> name LIKE $1 (argument "a%b_")
//   "x"     -> col = $1
// Non-text values are always equality constraints.

use crate::storage::Value;

/// Comparison tokens recognized at the start of a text constraint
/// Two-character tokens come first so ">=" is never read as ">"
const COMPARISON_TOKENS: [&str; 5] = [">=", "<=", "<>", ">", "<"];

/// Ordered mapping from column name to constraint value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    entries: Vec<(String, Value)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint; a column that is already present keeps its position
    /// and takes the new value
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Conditions {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut conditions = Conditions::new();
        for (column, value) in iter {
            conditions.insert(column, value.into());
        }
        conditions
    }
}

/// How a single constraint value is applied to its column
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Equal(Value),
    Compare(&'static str, Value),
    Like(String),
}

impl Constraint {
    /// Classify a constraint value in one pass:
    /// comparison prefix (any token), then wildcards, then equality
    pub fn classify(value: &Value) -> Constraint {
        let text = match value {
            Value::Text(text) => text,
            other => return Constraint::Equal(other.clone()),
        };

        if let Some(op) = COMPARISON_TOKENS.iter().find(|op| text.starts_with(**op)) {
            return Constraint::Compare(*op, Value::Text(text[op.len()..].to_string()));
        }

        if text.contains('*') || text.contains('?') {
            // % and _ already in the text are passed through unescaped
            return Constraint::Like(text.replace('*', "%").replace('?', "_"));
        }

        Constraint::Equal(value.clone())
    }

    fn operator(&self) -> &'static str {
        match self {
            Constraint::Equal(_) => "=",
            Constraint::Compare(op, _) => *op,
            Constraint::Like(_) => "LIKE",
        }
    }

    fn into_argument(self) -> Value {
        match self {
            Constraint::Equal(value) | Constraint::Compare(_, value) => value,
            Constraint::Like(pattern) => Value::Text(pattern),
        }
    }
}

/// A translated predicate: clause text plus its positional arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub clause: String,
    pub args: Vec<Value>,
}

impl Predicate {
    /// An empty predicate means no WHERE clause at all
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}

/// Translate conditions into `col <op> $n` clauses joined by AND
/// Placeholders are numbered from 1 in the conditions' order
pub fn translate(conditions: &Conditions) -> Predicate {
    let mut clauses = Vec::with_capacity(conditions.len());
    let mut args = Vec::with_capacity(conditions.len());

    for (position, (column, value)) in conditions.iter().enumerate() {
        let constraint = Constraint::classify(value);
        clauses.push(format!("{} {} ${}", column, constraint.operator(), position + 1));
        args.push(constraint.into_argument());
    }

    Predicate {
        clause: clauses.join(" AND "),
        args,
    }
}
