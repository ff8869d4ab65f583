//! Statement values built by repositories and rendered to SQL.
//!
//! # Responsibility
//! - Turn table metadata, predicates, sorting and paging into one
//!   parameterized SQL string plus its bound values.
//!
//! # Invariants
//! - A statement renders its predicate exactly as given; any filtering
//!   policy is applied by the caller before the statement is built.
//! - Each statement executes as exactly one SQLite statement.

use super::page::{Sort, Window};
use super::predicate::{quote_ident, Predicate};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// `SELECT <columns> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT ..]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    table: String,
    columns: Vec<String>,
    predicate: Option<Predicate>,
    sort: Sort,
    limit: Option<u64>,
    offset: u64,
}

impl SelectStatement {
    pub fn new<C: AsRef<str>>(table: impl Into<String>, columns: &[C]) -> Self {
        Self {
            table: table.into(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            predicate: None,
            sort: Sort::unsorted(),
            limit: None,
            offset: 0,
        }
    }

    pub fn filter(mut self, predicate: Option<Predicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn order_by(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Applies both bounds of `window`.
    pub fn window(mut self, window: Window) -> Self {
        self.limit = window.limit;
        self.offset = window.offset;
        self
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let columns = self
            .columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {columns} FROM {}", quote_ident(&self.table));
        let mut binds = Vec::new();

        write_where(self.predicate.as_ref(), &mut sql, &mut binds);

        if let Some(order_by) = self.sort.to_sql() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by);
        }

        match self.limit {
            Some(limit) => {
                sql.push_str(" LIMIT ?");
                binds.push(int_value(limit));
                if self.offset > 0 {
                    sql.push_str(" OFFSET ?");
                    binds.push(int_value(self.offset));
                }
            }
            None if self.offset > 0 => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                binds.push(int_value(self.offset));
            }
            None => {}
        }

        (sql, binds)
    }
}

/// `SELECT COUNT(*) FROM <table> [WHERE ..]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountStatement {
    table: String,
    predicate: Option<Predicate>,
}

impl CountStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicate: None,
        }
    }

    pub fn filter(mut self, predicate: Option<Predicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&self.table));
        let mut binds = Vec::new();
        write_where(self.predicate.as_ref(), &mut sql, &mut binds);
        (sql, binds)
    }

    pub fn query(&self, conn: &Connection) -> rusqlite::Result<u64> {
        let (sql, binds) = self.to_sql();
        let count: i64 = conn.query_row(&sql, params_from_iter(binds), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// `UPDATE <table> SET <column> = ?, .. [WHERE ..]`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    table: String,
    assignments: Vec<(String, Value)>,
    predicate: Option<Predicate>,
}

impl UpdateStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            assignments: Vec::new(),
            predicate: None,
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    pub fn filter(mut self, predicate: Option<Predicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut binds = Vec::with_capacity(self.assignments.len());
        let assignments = self
            .assignments
            .iter()
            .map(|(column, value)| {
                binds.push(value.clone());
                format!("{} = ?", quote_ident(column))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("UPDATE {} SET {assignments}", quote_ident(&self.table));
        write_where(self.predicate.as_ref(), &mut sql, &mut binds);
        (sql, binds)
    }

    /// Executes the update and returns the number of changed rows.
    pub fn execute(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let (sql, binds) = self.to_sql();
        conn.execute(&sql, params_from_iter(binds))
    }
}

/// `DELETE FROM <table> [WHERE ..]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    table: String,
    predicate: Option<Predicate>,
}

impl DeleteStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicate: None,
        }
    }

    pub fn filter(mut self, predicate: Option<Predicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("DELETE FROM {}", quote_ident(&self.table));
        let mut binds = Vec::new();
        write_where(self.predicate.as_ref(), &mut sql, &mut binds);
        (sql, binds)
    }

    pub fn execute(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let (sql, binds) = self.to_sql();
        conn.execute(&sql, params_from_iter(binds))
    }
}

/// Insert-or-update keyed on the identifier columns.
///
/// Non-key columns are overwritten from the inserted row on conflict.
pub fn upsert_sql(table: &str, columns: &[&str], key_columns: &[&str]) -> String {
    let quoted_columns = columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");
    let conflict_target = key_columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = columns
        .iter()
        .filter(|column| !key_columns.contains(*column))
        .map(|column| {
            let quoted = quote_ident(column);
            format!("{quoted} = excluded.{quoted}")
        })
        .collect::<Vec<_>>();

    let on_conflict = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "INSERT INTO {} ({quoted_columns}) VALUES ({placeholders}) ON CONFLICT ({conflict_target}) {on_conflict}",
        quote_ident(table)
    )
}

fn write_where(predicate: Option<&Predicate>, sql: &mut String, binds: &mut Vec<Value>) {
    if let Some(predicate) = predicate {
        sql.push_str(" WHERE ");
        predicate.write_sql(sql, binds);
    }
}

fn int_value(value: u64) -> Value {
    Value::Integer(i64::try_from(value).unwrap_or(i64::MAX))
}
