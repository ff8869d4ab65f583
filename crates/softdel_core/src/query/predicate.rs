//! Boolean condition trees rendered to parameterized SQL.
//!
//! # Invariants
//! - Predicates are immutable values; combinators return new trees.
//! - Values are always bound as parameters, never spliced into SQL text.
//! - Identifiers are always double-quoted.

use rusqlite::types::Value;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
        }
    }
}

/// Condition over the columns of one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    IsNull(String),
    IsNotNull(String),
    /// Row-value membership. One inner vector per candidate row, each with
    /// one value per entry of `columns`.
    In {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Equality. Comparing against SQL `NULL` becomes `IS NULL`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => Self::IsNull(column.into()),
            value => Self::compare(column, CompareOp::Eq, value),
        }
    }

    /// Inequality. Comparing against SQL `NULL` becomes `IS NOT NULL`.
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => Self::IsNotNull(column.into()),
            value => Self::compare(column, CompareOp::Ne, value),
        }
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn le(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(column, CompareOp::Like, pattern.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::IsNotNull(column.into())
    }

    /// Single-column membership test.
    pub fn in_list(column: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Self::In {
            columns: vec![column.into()],
            rows: values.into_iter().map(|value| vec![value]).collect(),
        }
    }

    /// Conjunction of every predicate in `predicates`.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        predicates
            .into_iter()
            .fold(Self::And(Vec::new()), |acc, next| acc.and(next))
    }

    /// Disjunction of every predicate in `predicates`.
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Or(predicates.into_iter().collect())
    }

    /// Returns `self AND other`, flattening nested conjunctions.
    pub fn and(self, other: Predicate) -> Self {
        let mut terms = self.into_conjuncts();
        terms.extend(other.into_conjuncts());
        Self::And(terms)
    }

    pub fn or(self, other: Predicate) -> Self {
        Self::Or(vec![self, other])
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Top-level conjunct view of this predicate.
    pub fn conjuncts(&self) -> &[Predicate] {
        match self {
            Self::And(terms) => terms,
            other => std::slice::from_ref(other),
        }
    }

    fn into_conjuncts(self) -> Vec<Predicate> {
        match self {
            Self::And(terms) => terms,
            other => vec![other],
        }
    }

    /// Renders this predicate as a SQL boolean expression plus its binds.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut binds = Vec::new();
        self.write_sql(&mut sql, &mut binds);
        (sql, binds)
    }

    /// Appends this predicate to `sql`, pushing bound values in placeholder
    /// order.
    pub fn write_sql(&self, sql: &mut String, binds: &mut Vec<Value>) {
        match self {
            Self::Compare { column, op, value } => {
                sql.push_str(&quote_ident(column));
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push_str(" ?");
                binds.push(value.clone());
            }
            Self::IsNull(column) => {
                sql.push_str(&quote_ident(column));
                sql.push_str(" IS NULL");
            }
            Self::IsNotNull(column) => {
                sql.push_str(&quote_ident(column));
                sql.push_str(" IS NOT NULL");
            }
            Self::In { columns, rows } => write_in(columns, rows, sql, binds),
            Self::And(terms) => write_joined(terms, " AND ", "1 = 1", sql, binds),
            Self::Or(terms) => write_joined(terms, " OR ", "0 = 1", sql, binds),
            Self::Not(inner) => {
                sql.push_str("NOT (");
                inner.write_sql(sql, binds);
                sql.push(')');
            }
        }
    }
}

fn write_joined(
    terms: &[Predicate],
    separator: &str,
    empty: &str,
    sql: &mut String,
    binds: &mut Vec<Value>,
) {
    match terms {
        [] => sql.push_str(empty),
        [single] => single.write_sql(sql, binds),
        _ => {
            sql.push('(');
            for (index, term) in terms.iter().enumerate() {
                if index > 0 {
                    sql.push_str(separator);
                }
                sql.push('(');
                term.write_sql(sql, binds);
                sql.push(')');
            }
            sql.push(')');
        }
    }
}

fn write_in(columns: &[String], rows: &[Vec<Value>], sql: &mut String, binds: &mut Vec<Value>) {
    if rows.is_empty() || columns.is_empty() {
        sql.push_str("0 = 1");
        return;
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    if let [column] = columns {
        sql.push_str(&quote_ident(column));
        sql.push_str(" IN (");
        sql.push_str(&vec!["?"; rows.len()].join(", "));
        sql.push(')');
    } else {
        let quoted = columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        sql.push('(');
        sql.push_str(&quoted);
        sql.push_str(") IN (VALUES ");
        sql.push_str(&vec![format!("({placeholders})"); rows.len()].join(", "));
        sql.push(')');
    }

    for row in rows {
        binds.extend(row.iter().cloned());
    }
}

/// Double-quotes a SQL identifier, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
