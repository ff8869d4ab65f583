//! Construction-time validation of an entity mapping against a connection.

use super::{RepoError, RepoResult};
use crate::db::schema::{table_columns, table_exists};
use crate::model::entity::EntityMapping;
use crate::model::REMOVED_AT_COLUMN;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Verifies that `mapping` can be bound to `conn`.
///
/// `require_marker` additionally demands the `removed_at` column; `verify_schema`
/// enables the table/column existence checks.
pub(crate) fn ensure_mapping_ready<M: EntityMapping>(
    conn: &Connection,
    mapping: &M,
    require_marker: bool,
    verify_schema: bool,
) -> RepoResult<()> {
    let entity = mapping.entity_type_name();
    let table = mapping.table_name();

    for identifier in std::iter::once(table).chain(mapping.columns().iter().copied()) {
        if !IDENTIFIER_RE.is_match(identifier) {
            return Err(RepoError::InvalidArgument(format!(
                "{entity} mapping uses invalid SQL identifier `{identifier}`"
            )));
        }
    }

    if mapping.id_attribute_names().is_empty() {
        return Err(RepoError::InvalidArgument(format!(
            "{entity} mapping declares no id attribute"
        )));
    }
    for id_name in mapping.id_attribute_names() {
        if !mapping.columns().contains(id_name) {
            return Err(RepoError::InvalidArgument(format!(
                "{entity} id attribute `{id_name}` is not a mapped column"
            )));
        }
    }

    if require_marker && !mapping.columns().contains(&REMOVED_AT_COLUMN) {
        return Err(RepoError::MarkerNotMapped(entity.to_string()));
    }

    if !verify_schema {
        return Ok(());
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table.to_string()));
    }

    let existing = table_columns(conn, table)?;
    for column in mapping.columns() {
        if !existing.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: table.to_string(),
                column: *column,
            });
        }
    }

    Ok(())
}
