//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise `softdel_core` end to end against an in-memory database.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Set `SOFTDEL_LOG_DIR` to an absolute path to also write the core log file.

use log::info;
use rusqlite::types::{Type, Value};
use rusqlite::Row;
use softdel_core::{
    core_version, default_log_level, init_logging, open_db_in_memory, CrudRepository,
    EntityMapping, EntityMetadata, LogSettings, PageRequest, RepositoryFactory, Sort,
};
use std::error::Error;
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE accounts (
    id TEXT PRIMARY KEY,
    handle TEXT NOT NULL,
    removed_at INTEGER
);
";

struct Account {
    id: Uuid,
    handle: String,
    removed_at: Option<i64>,
}

struct AccountMapping;

impl EntityMetadata for AccountMapping {
    type Entity = Account;
    type Id = Uuid;

    fn entity_type_name(&self) -> &str {
        "Account"
    }

    fn id_attribute_names(&self) -> &[&'static str] {
        &["id"]
    }

    fn extract_id(&self, entity: &Account) -> Option<Uuid> {
        Some(entity.id)
    }

    fn id_value(&self, id: &Uuid) -> Option<Value> {
        Some(Value::Text(id.to_string()))
    }

    fn extract_composite_component(&self, _id: &Uuid, _name: &str) -> Option<Value> {
        None
    }
}

impl EntityMapping for AccountMapping {
    fn table_name(&self) -> &str {
        "accounts"
    }

    fn columns(&self) -> &[&'static str] {
        &["id", "handle", "removed_at"]
    }

    fn to_values(&self, entity: &Account) -> Vec<Value> {
        vec![
            entity.id.to_string().into(),
            entity.handle.clone().into(),
            entity.removed_at.into(),
        ]
    }

    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Account> {
        let id: String = row.get(0)?;
        let id = Uuid::parse_str(&id).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err))
        })?;
        Ok(Account {
            id,
            handle: row.get(1)?,
            removed_at: row.get(2)?,
        })
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var("SOFTDEL_LOG_DIR") {
        init_logging(&LogSettings::new(default_log_level(), log_dir))?;
    }
    println!("softdel_core version={}", core_version());

    let conn = open_db_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    let factory = RepositoryFactory::new(&conn);
    let accounts = factory.soft_delete(AccountMapping)?;

    let batch = (0..20)
        .map(|n| Account {
            id: Uuid::new_v4(),
            handle: format!("account{n:02}"),
            removed_at: None,
        })
        .collect::<Vec<_>>();
    accounts.save_all(&batch)?;
    println!("saved={}", accounts.count()?);

    let first = &batch[0];
    accounts.delete(first)?;
    println!(
        "after_delete live={} find_by_id_present={}",
        accounts.count()?,
        accounts.find_by_id(&first.id)?.is_some()
    );

    let page = accounts.find_page(&PageRequest::of(0, 5).sorted(Sort::asc("handle")))?;
    accounts.delete_in_batch(&page.content)?;
    println!(
        "after_batch live={} removed={}",
        accounts.count()?,
        accounts.count_removed(None)?
    );

    accounts.delete_all_in_batch()?;
    let stored: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
    println!(
        "after_all live={} stored={stored}",
        accounts.count()?
    );
    info!("event=cli_smoke module=cli status=ok stored={stored}");

    Ok(())
}
