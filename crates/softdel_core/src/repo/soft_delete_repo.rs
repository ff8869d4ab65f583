//! Soft-delete repository.
//!
//! # Responsibility
//! - Turn every delete path into an `UPDATE` that stamps `removed_at`.
//! - Restrict every read and count to live rows.
//!
//! # Invariants
//! - No statement issued here removes a row physically.
//! - Caller predicates are composed with `removed_at IS NULL`, never replaced.
//! - With [`RemovalScope::LiveOnly`] a row keeps its first removal timestamp.

use super::crud_repo::{not_found, require_id, require_ids, SqliteCrudRepository};
use super::{CrudRepository, RepoResult};
use crate::config::{RemovalScope, SoftDeleteConfig};
use crate::db::in_unit_of_work;
use crate::model::entity::EntityMapping;
use crate::model::REMOVED_AT_COLUMN;
use crate::query::composer::{
    batch_identity_predicate, compose, deletion_filter, identity_predicate,
};
use crate::query::page::{Sort, Window};
use crate::query::predicate::Predicate;
use crate::query::statement::{CountStatement, SelectStatement, UpdateStatement};
use log::{debug, warn};
use rusqlite::Connection;
use std::time::{SystemTime, UNIX_EPOCH};

/// Repository whose deletes only mark rows as removed.
pub struct SoftDeleteRepository<'conn, M: EntityMapping> {
    inner: SqliteCrudRepository<'conn, M>,
    config: SoftDeleteConfig,
}

impl<'conn, M: EntityMapping> SoftDeleteRepository<'conn, M> {
    /// Binds `mapping` to `conn` with the default configuration.
    ///
    /// Fails with `MarkerNotMapped` when `mapping` has no `removed_at` column.
    pub fn try_new(conn: &'conn Connection, mapping: M) -> RepoResult<Self> {
        Self::try_with_config(conn, mapping, SoftDeleteConfig::default())
    }

    pub fn try_with_config(
        conn: &'conn Connection,
        mapping: M,
        config: SoftDeleteConfig,
    ) -> RepoResult<Self> {
        let inner = SqliteCrudRepository::try_with_checks(conn, mapping, true, config.verify_schema)?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &SoftDeleteConfig {
        &self.config
    }

    pub fn connection(&self) -> &'conn Connection {
        self.inner.connection()
    }

    /// Finds removed entities matching `predicate`.
    pub fn find_removed(
        &self,
        predicate: Option<Predicate>,
        sort: &Sort,
    ) -> RepoResult<Vec<M::Entity>> {
        let removed = compose(predicate, deletion_filter(true));
        self.inner.run_select(&self.inner.get_query(Some(removed), sort))
    }

    /// Counts removed entities matching `predicate`.
    pub fn count_removed(&self, predicate: Option<Predicate>) -> RepoResult<u64> {
        let removed = compose(predicate, deletion_filter(true));
        self.inner
            .run_count(&self.inner.get_count_query(Some(removed)))
    }

    fn mark_removed(&self, mode: &'static str, predicate: Option<Predicate>) -> RepoResult<usize> {
        let target = match self.config.removal_scope {
            RemovalScope::LiveOnly => Some(compose(predicate, deletion_filter(false))),
            RemovalScope::Always => predicate,
        };
        let mapping = self.inner.mapping();
        let changed = UpdateStatement::new(mapping.table_name())
            .set(REMOVED_AT_COLUMN, removal_timestamp())
            .filter(target)
            .execute(self.inner.connection())?;
        debug!(
            "event=soft_delete module=repo status=ok entity={} mode={mode} rows={changed}",
            mapping.entity_type_name()
        );
        Ok(changed)
    }
}

impl<M: EntityMapping> CrudRepository for SoftDeleteRepository<'_, M> {
    type Entity = M::Entity;
    type Id = M::Id;
    type Mapping = M;

    fn mapping(&self) -> &M {
        self.inner.mapping()
    }

    fn get_query(&self, predicate: Option<Predicate>, sort: &Sort) -> SelectStatement {
        let live = compose(predicate, deletion_filter(false));
        self.inner.get_query(Some(live), sort)
    }

    fn get_count_query(&self, predicate: Option<Predicate>) -> CountStatement {
        let live = compose(predicate, deletion_filter(false));
        self.inner.get_count_query(Some(live))
    }

    fn query_rows(
        &self,
        predicate: Option<Predicate>,
        sort: &Sort,
        window: Window,
    ) -> RepoResult<Vec<M::Entity>> {
        self.inner.run_select(&self.get_query(predicate, sort).window(window))
    }

    fn query_count(&self, predicate: Option<Predicate>) -> RepoResult<u64> {
        self.inner.run_count(&self.get_count_query(predicate))
    }

    fn save(&self, entity: &M::Entity) -> RepoResult<()> {
        self.inner.save(entity)
    }

    fn save_all(&self, entities: &[M::Entity]) -> RepoResult<()> {
        self.inner.save_all(entities)
    }

    fn delete(&self, entity: &M::Entity) -> RepoResult<()> {
        let id = require_id(self.mapping(), entity)?;
        let identity = identity_predicate(self.mapping(), &id)?;
        self.mark_removed("single", Some(identity))?;
        Ok(())
    }

    fn delete_by_id(&self, id: &M::Id) -> RepoResult<()> {
        in_unit_of_work(self.connection(), |_| {
            let entity = self
                .find_by_id(id)?
                .ok_or_else(|| not_found(self.mapping(), id))?;
            self.delete(&entity)
        })
    }

    fn delete_in_batch(&self, entities: &[M::Entity]) -> RepoResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let ids = require_ids(self.mapping(), entities)?;
        let identities = batch_identity_predicate(self.mapping(), &ids)?;
        let binds = ids.len() * self.mapping().id_attribute_names().len();
        self.mark_removed("batch", Some(identities))
            .inspect_err(|err| {
                warn!(
                    "event=soft_delete module=repo status=error entity={} mode=batch binds={binds} error={err}",
                    self.mapping().entity_type_name()
                );
            })?;
        Ok(())
    }

    fn delete_all_in_batch(&self) -> RepoResult<()> {
        self.mark_removed("all", None)?;
        Ok(())
    }

    fn delete_all_entities(&self, entities: &[M::Entity]) -> RepoResult<()> {
        in_unit_of_work(self.connection(), |_| {
            entities.iter().try_for_each(|entity| self.delete(entity))
        })
    }

    fn delete_all(&self) -> RepoResult<()> {
        in_unit_of_work(self.connection(), |_| {
            self.find_all()?
                .iter()
                .try_for_each(|entity| self.delete(entity))
        })
    }
}

/// Milliseconds since the Unix epoch; clocks before the epoch yield 0.
fn removal_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
