//! Repository construction for one connection.

use super::crud_repo::SqliteCrudRepository;
use super::soft_delete_repo::SoftDeleteRepository;
use super::RepoResult;
use crate::config::SoftDeleteConfig;
use crate::model::entity::EntityMapping;
use rusqlite::Connection;

/// Builds repositories that share a connection and configuration.
///
/// Each call validates the mapping it is given, so a factory can hand out
/// repositories for any number of entity types.
pub struct RepositoryFactory<'conn> {
    conn: &'conn Connection,
    config: SoftDeleteConfig,
}

impl<'conn> RepositoryFactory<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_config(conn, SoftDeleteConfig::default())
    }

    pub fn with_config(conn: &'conn Connection, config: SoftDeleteConfig) -> Self {
        Self { conn, config }
    }

    pub fn config(&self) -> &SoftDeleteConfig {
        &self.config
    }

    /// Repository with physical deletes.
    pub fn plain<M: EntityMapping>(&self, mapping: M) -> RepoResult<SqliteCrudRepository<'conn, M>> {
        SqliteCrudRepository::try_with_checks(self.conn, mapping, false, self.config.verify_schema)
    }

    /// Repository whose deletes stamp `removed_at`.
    pub fn soft_delete<M: EntityMapping>(
        &self,
        mapping: M,
    ) -> RepoResult<SoftDeleteRepository<'conn, M>> {
        SoftDeleteRepository::try_with_config(self.conn, mapping, self.config.clone())
    }
}
