#![allow(dead_code)]

use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row};
use softdel_core::db::open_db_in_memory;
use softdel_core::{EntityMapping, EntityMetadata};
use std::cell::RefCell;
use uuid::Uuid;

pub const SCHEMA: &str = "
CREATE TABLE users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    removed_at INTEGER
);
CREATE TABLE memberships (
    org_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    removed_at INTEGER,
    PRIMARY KEY (org_id, user_id)
);
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub removed_at: Option<i64>,
}

impl User {
    pub fn new(name: &str) -> Self {
        Self {
            id: Some(Uuid::new_v4()),
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_ascii_lowercase())),
            removed_at: None,
        }
    }
}

pub struct UserMapping;

impl EntityMetadata for UserMapping {
    type Entity = User;
    type Id = Uuid;

    fn entity_type_name(&self) -> &str {
        "User"
    }

    fn id_attribute_names(&self) -> &[&'static str] {
        &["id"]
    }

    fn extract_id(&self, entity: &User) -> Option<Uuid> {
        entity.id
    }

    fn id_value(&self, id: &Uuid) -> Option<Value> {
        Some(Value::Text(id.to_string()))
    }

    fn extract_composite_component(&self, _id: &Uuid, _name: &str) -> Option<Value> {
        None
    }
}

impl EntityMapping for UserMapping {
    fn table_name(&self) -> &str {
        "users"
    }

    fn columns(&self) -> &[&'static str] {
        &["id", "name", "email", "removed_at"]
    }

    fn to_values(&self, entity: &User) -> Vec<Value> {
        vec![
            entity.id.map(|id| id.to_string()).into(),
            entity.name.clone().into(),
            entity.email.clone().into(),
            entity.removed_at.into(),
        ]
    }

    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<User> {
        let id: String = row.get(0)?;
        let id = Uuid::parse_str(&id)
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err)))?;
        Ok(User {
            id: Some(id),
            name: row.get(1)?,
            email: row.get(2)?,
            removed_at: row.get(3)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipId {
    pub org_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub id: MembershipId,
    pub role: String,
    pub removed_at: Option<i64>,
}

impl Membership {
    pub fn new(org_id: i64, user_id: i64, role: &str) -> Self {
        Self {
            id: MembershipId { org_id, user_id },
            role: role.to_string(),
            removed_at: None,
        }
    }
}

pub struct MembershipMapping;

impl EntityMetadata for MembershipMapping {
    type Entity = Membership;
    type Id = MembershipId;

    fn entity_type_name(&self) -> &str {
        "Membership"
    }

    fn id_attribute_names(&self) -> &[&'static str] {
        &["org_id", "user_id"]
    }

    fn extract_id(&self, entity: &Membership) -> Option<MembershipId> {
        Some(entity.id)
    }

    fn id_value(&self, _id: &MembershipId) -> Option<Value> {
        None
    }

    fn extract_composite_component(&self, id: &MembershipId, name: &str) -> Option<Value> {
        match name {
            "org_id" => Some(Value::Integer(id.org_id)),
            "user_id" => Some(Value::Integer(id.user_id)),
            _ => None,
        }
    }
}

impl EntityMapping for MembershipMapping {
    fn table_name(&self) -> &str {
        "memberships"
    }

    fn columns(&self) -> &[&'static str] {
        &["org_id", "user_id", "role", "removed_at"]
    }

    fn to_values(&self, entity: &Membership) -> Vec<Value> {
        vec![
            entity.id.org_id.into(),
            entity.id.user_id.into(),
            entity.role.clone().into(),
            entity.removed_at.into(),
        ]
    }

    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Membership> {
        Ok(Membership {
            id: MembershipId {
                org_id: row.get(0)?,
                user_id: row.get(1)?,
            },
            role: row.get(2)?,
            removed_at: row.get(3)?,
        })
    }
}

pub fn test_db() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
}

/// Rows in `table` regardless of `removed_at`.
pub fn raw_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

pub fn raw_removed_at(conn: &Connection, id: &Uuid) -> Option<i64> {
    conn.query_row(
        "SELECT removed_at FROM users WHERE id = ?1",
        [id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}

thread_local! {
    static TRACED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record_statement(sql: &str) {
    TRACED.with(|traced| traced.borrow_mut().push(sql.trim().to_string()));
}

/// Records every statement `conn` executes on this thread from now on.
pub fn trace_statements(conn: &mut Connection) {
    clear_traced();
    conn.trace(Some(record_statement));
}

pub fn clear_traced() {
    TRACED.with(|traced| traced.borrow_mut().clear());
}

/// Traced statements whose leading keyword is `keyword`.
pub fn traced_with(keyword: &str) -> Vec<String> {
    TRACED.with(|traced| {
        traced
            .borrow()
            .iter()
            .filter(|sql| {
                sql.split_whitespace()
                    .next()
                    .is_some_and(|first| first.eq_ignore_ascii_case(keyword))
            })
            .cloned()
            .collect()
    })
}
