//! Soft-delete repository layer over SQLite.
//!
//! Deletes issued through [`SoftDeleteRepository`] stamp a `removed_at`
//! timestamp instead of removing rows, and every read it serves sees live
//! rows only. [`SqliteCrudRepository`] is the plain variant it wraps.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;

pub use config::{RemovalScope, SoftDeleteConfig};
pub use db::{in_unit_of_work, open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::entity::{EntityMapping, EntityMetadata};
pub use model::REMOVED_AT_COLUMN;
pub use query::page::{Direction, Page, PageRequest, Sort, Window};
pub use query::predicate::{CompareOp, Predicate};
pub use repo::crud_repo::SqliteCrudRepository;
pub use repo::factory::RepositoryFactory;
pub use repo::soft_delete_repo::SoftDeleteRepository;
pub use repo::{CrudRepository, RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
