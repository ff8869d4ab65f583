//! Plain SQLite CRUD repository.
//!
//! # Responsibility
//! - Execute the conventional repository surface for one entity mapping.
//! - Provide the statement machinery that `SoftDeleteRepository` wraps.
//!
//! # Invariants
//! - Predicates reach SQL exactly as the caller passed them.
//! - Delete paths physically remove rows.

use super::mapping_check::ensure_mapping_ready;
use super::{CrudRepository, RepoError, RepoResult};
use crate::db::in_unit_of_work;
use crate::model::entity::{EntityMapping, EntityMetadata};
use crate::query::composer::{batch_identity_predicate, identity_predicate};
use crate::query::page::{Sort, Window};
use crate::query::predicate::Predicate;
use crate::query::statement::{upsert_sql, CountStatement, DeleteStatement, SelectStatement};
use log::debug;
use rusqlite::{params_from_iter, Connection};

/// SQLite-backed repository with physical deletes.
pub struct SqliteCrudRepository<'conn, M: EntityMapping> {
    conn: &'conn Connection,
    mapping: M,
}

impl<'conn, M: EntityMapping> SqliteCrudRepository<'conn, M> {
    /// Binds `mapping` to `conn` after checking the table and its columns.
    pub fn try_new(conn: &'conn Connection, mapping: M) -> RepoResult<Self> {
        Self::try_with_checks(conn, mapping, false, true)
    }

    pub(crate) fn try_with_checks(
        conn: &'conn Connection,
        mapping: M,
        require_marker: bool,
        verify_schema: bool,
    ) -> RepoResult<Self> {
        ensure_mapping_ready(conn, &mapping, require_marker, verify_schema)?;
        Ok(Self { conn, mapping })
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Executes a prebuilt row query. Callers own its filtering.
    pub(crate) fn run_select(&self, statement: &SelectStatement) -> RepoResult<Vec<M::Entity>> {
        let (sql, binds) = statement.to_sql();
        let mut prepared = self.conn.prepare(&sql)?;
        let mut rows = prepared.query(params_from_iter(binds))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            let entity = self.mapping.from_row(row).map_err(|err| {
                RepoError::InvalidData(format!(
                    "cannot decode {} row from `{}`: {err}",
                    self.mapping.entity_type_name(),
                    self.mapping.table_name()
                ))
            })?;
            entities.push(entity);
        }
        Ok(entities)
    }

    pub(crate) fn run_count(&self, statement: &CountStatement) -> RepoResult<u64> {
        Ok(statement.query(self.conn)?)
    }

    fn delete_matching(&self, mode: &'static str, predicate: Option<Predicate>) -> RepoResult<usize> {
        let changed = DeleteStatement::new(self.mapping.table_name())
            .filter(predicate)
            .execute(self.conn)?;
        debug!(
            "event=hard_delete module=repo status=ok entity={} mode={mode} rows={changed}",
            self.mapping.entity_type_name()
        );
        Ok(changed)
    }
}

impl<M: EntityMapping> CrudRepository for SqliteCrudRepository<'_, M> {
    type Entity = M::Entity;
    type Id = M::Id;
    type Mapping = M;

    fn mapping(&self) -> &M {
        &self.mapping
    }

    fn get_query(&self, predicate: Option<Predicate>, sort: &Sort) -> SelectStatement {
        SelectStatement::new(self.mapping.table_name(), self.mapping.columns())
            .filter(predicate)
            .order_by(sort.clone())
    }

    fn get_count_query(&self, predicate: Option<Predicate>) -> CountStatement {
        CountStatement::new(self.mapping.table_name()).filter(predicate)
    }

    fn query_rows(
        &self,
        predicate: Option<Predicate>,
        sort: &Sort,
        window: Window,
    ) -> RepoResult<Vec<M::Entity>> {
        self.run_select(&self.get_query(predicate, sort).window(window))
    }

    fn query_count(&self, predicate: Option<Predicate>) -> RepoResult<u64> {
        self.run_count(&self.get_count_query(predicate))
    }

    fn save(&self, entity: &M::Entity) -> RepoResult<()> {
        require_id(&self.mapping, entity)?;
        let columns = self.mapping.columns();
        let values = self.mapping.to_values(entity);
        if values.len() != columns.len() {
            return Err(RepoError::InvalidArgument(format!(
                "{} mapping produced {} values for {} columns",
                self.mapping.entity_type_name(),
                values.len(),
                columns.len()
            )));
        }

        let sql = upsert_sql(
            self.mapping.table_name(),
            columns,
            self.mapping.id_attribute_names(),
        );
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn save_all(&self, entities: &[M::Entity]) -> RepoResult<()> {
        in_unit_of_work(self.conn, |_| {
            entities.iter().try_for_each(|entity| self.save(entity))
        })
    }

    fn delete(&self, entity: &M::Entity) -> RepoResult<()> {
        let id = require_id(&self.mapping, entity)?;
        let identity = identity_predicate(&self.mapping, &id)?;
        self.delete_matching("single", Some(identity))?;
        Ok(())
    }

    fn delete_by_id(&self, id: &M::Id) -> RepoResult<()> {
        in_unit_of_work(self.conn, |_| {
            let entity = self
                .find_by_id(id)?
                .ok_or_else(|| not_found(&self.mapping, id))?;
            self.delete(&entity)
        })
    }

    fn delete_in_batch(&self, entities: &[M::Entity]) -> RepoResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let ids = require_ids(&self.mapping, entities)?;
        let identities = batch_identity_predicate(&self.mapping, &ids)?;
        self.delete_matching("batch", Some(identities))?;
        Ok(())
    }

    fn delete_all_in_batch(&self) -> RepoResult<()> {
        self.delete_matching("all", None)?;
        Ok(())
    }

    fn delete_all_entities(&self, entities: &[M::Entity]) -> RepoResult<()> {
        in_unit_of_work(self.conn, |_| {
            entities.iter().try_for_each(|entity| self.delete(entity))
        })
    }

    fn delete_all(&self) -> RepoResult<()> {
        in_unit_of_work(self.conn, |_| {
            self.find_all()?
                .iter()
                .try_for_each(|entity| self.delete(entity))
        })
    }
}

/// Extracts the id of `entity`, rejecting entities without one.
pub(crate) fn require_id<M: EntityMetadata>(mapping: &M, entity: &M::Entity) -> RepoResult<M::Id> {
    mapping.extract_id(entity).ok_or_else(|| {
        RepoError::InvalidArgument(format!(
            "the given {} has no id value",
            mapping.entity_type_name()
        ))
    })
}

pub(crate) fn require_ids<M: EntityMetadata>(
    mapping: &M,
    entities: &[M::Entity],
) -> RepoResult<Vec<M::Id>> {
    entities
        .iter()
        .map(|entity| require_id(mapping, entity))
        .collect()
}

pub(crate) fn not_found<M: EntityMetadata>(mapping: &M, id: &M::Id) -> RepoError {
    RepoError::NotFound {
        entity: mapping.entity_type_name().to_string(),
        id: format!("{id:?}"),
    }
}
