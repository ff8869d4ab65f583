//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the CRUD operation surface shared by plain and soft-delete
//!   repositories.
//! - Route every read through the two statement choke points,
//!   [`CrudRepository::get_query`] and [`CrudRepository::get_count_query`].
//!
//! # Invariants
//! - Required arguments are validated before any statement is built.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidArgument`)
//!   in addition to DB transport errors, which pass through unchanged.

use crate::db::DbError;
use crate::model::entity::EntityMapping;
use crate::model::REMOVED_AT_COLUMN;
use crate::query::composer::{batch_identity_predicate, identity_predicate};
use crate::query::page::{Page, PageRequest, Sort, Window};
use crate::query::predicate::Predicate;
use crate::query::statement::{CountStatement, SelectStatement};
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub mod crud_repo;
pub mod factory;
mod mapping_check;
pub mod soft_delete_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// A required input is absent (missing id, empty key component,
    /// zero page size).
    InvalidArgument(String),
    /// Id-targeted lookup or delete found no live row.
    NotFound { entity: String, id: String },
    /// A single-row read matched more than one row.
    IncorrectResultSize { expected: u64, actual: u64 },
    /// The entity mapping does not declare the `removed_at` column.
    MarkerNotMapped(String),
    /// Required table is missing from the connected schema.
    MissingRequiredTable(String),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: String,
        column: &'static str,
    },
    /// Persisted data cannot be decoded into the entity type.
    InvalidData(String),
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::IncorrectResultSize { expected, actual } => write!(
                f,
                "incorrect result size: expected {expected}, actual {actual}"
            ),
            Self::MarkerNotMapped(entity) => write!(
                f,
                "entity mapping for {entity} does not declare column `{REMOVED_AT_COLUMN}`"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Conventional CRUD repository surface.
///
/// Implementors supply statement construction, execution and the delete
/// paths. Execution only accepts predicates, never prebuilt statements, and
/// every read below is a provided method built on
/// [`CrudRepository::query_rows`] or [`CrudRepository::query_count`]. Those
/// run [`CrudRepository::get_query`] / [`CrudRepository::get_count_query`],
/// so a filtering policy applied there covers the whole read surface.
pub trait CrudRepository {
    type Entity;
    type Id: Debug;
    type Mapping: EntityMapping<Entity = Self::Entity, Id = Self::Id>;

    fn mapping(&self) -> &Self::Mapping;

    /// Builds the row query for `predicate`, ordered by `sort`.
    fn get_query(&self, predicate: Option<Predicate>, sort: &Sort) -> SelectStatement;

    /// Builds the count query for `predicate`.
    fn get_count_query(&self, predicate: Option<Predicate>) -> CountStatement;

    /// Loads the rows of [`CrudRepository::get_query`] within `window`.
    fn query_rows(
        &self,
        predicate: Option<Predicate>,
        sort: &Sort,
        window: Window,
    ) -> RepoResult<Vec<Self::Entity>>;

    /// Counts the rows of [`CrudRepository::get_count_query`].
    fn query_count(&self, predicate: Option<Predicate>) -> RepoResult<u64>;

    /// Inserts or replaces one entity by id.
    fn save(&self, entity: &Self::Entity) -> RepoResult<()>;

    /// Saves every entity in one unit of work.
    fn save_all(&self, entities: &[Self::Entity]) -> RepoResult<()>;

    /// Deletes one entity. Absent rows are not an error.
    fn delete(&self, entity: &Self::Entity) -> RepoResult<()>;

    /// Deletes one entity by id, failing with `NotFound` when absent.
    fn delete_by_id(&self, id: &Self::Id) -> RepoResult<()>;

    /// Deletes the given entities with a single statement.
    ///
    /// The statement binds one value per id column per entity, so a batch is
    /// bounded by the connection's SQLite variable limit. A larger batch fails
    /// with [`RepoError::Db`] and touches no row; split it and wrap the calls
    /// in one unit of work when it must stay atomic.
    fn delete_in_batch(&self, entities: &[Self::Entity]) -> RepoResult<()>;

    /// Deletes every row of the table with a single statement.
    fn delete_all_in_batch(&self) -> RepoResult<()>;

    /// Deletes the given entities one at a time.
    fn delete_all_entities(&self, entities: &[Self::Entity]) -> RepoResult<()>;

    /// Deletes every visible entity one at a time.
    fn delete_all(&self) -> RepoResult<()>;

    fn find_by_id(&self, id: &Self::Id) -> RepoResult<Option<Self::Entity>> {
        let identity = identity_predicate(self.mapping(), id)?;
        let rows = self.query_rows(Some(identity), &Sort::unsorted(), Window::first(1))?;
        Ok(rows.into_iter().next())
    }

    fn exists_by_id(&self, id: &Self::Id) -> RepoResult<bool> {
        let identity = identity_predicate(self.mapping(), id)?;
        Ok(self.query_count(Some(identity))? > 0)
    }

    fn find_all(&self) -> RepoResult<Vec<Self::Entity>> {
        self.find_all_matching(None, &Sort::unsorted())
    }

    fn find_all_sorted(&self, sort: &Sort) -> RepoResult<Vec<Self::Entity>> {
        self.find_all_matching(None, sort)
    }

    /// Same bind limit as [`CrudRepository::delete_in_batch`].
    fn find_all_by_id(&self, ids: &[Self::Id]) -> RepoResult<Vec<Self::Entity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let identities = batch_identity_predicate(self.mapping(), ids)?;
        self.find_all_matching(Some(identities), &Sort::unsorted())
    }

    fn find_all_matching(
        &self,
        predicate: Option<Predicate>,
        sort: &Sort,
    ) -> RepoResult<Vec<Self::Entity>> {
        self.query_rows(predicate, sort, Window::all())
    }

    /// Finds entities whose non-null columns equal those of `example`.
    ///
    /// The `removed_at` column never takes part in the match.
    fn find_all_by_example(&self, example: &Self::Entity) -> RepoResult<Vec<Self::Entity>> {
        let predicate = example_predicate(self.mapping(), example);
        self.find_all_matching(Some(predicate), &Sort::unsorted())
    }

    fn find_page(&self, request: &PageRequest) -> RepoResult<Page<Self::Entity>> {
        self.find_page_matching(None, request)
    }

    /// Loads one page of matching entities plus the matching total.
    ///
    /// Unsorted requests are ordered by the id columns so pages are stable.
    fn find_page_matching(
        &self,
        predicate: Option<Predicate>,
        request: &PageRequest,
    ) -> RepoResult<Page<Self::Entity>> {
        if request.size == 0 {
            return Err(RepoError::InvalidArgument(
                "page size must be greater than zero".to_string(),
            ));
        }

        let total_elements = self.query_count(predicate.clone())?;
        let sort = if request.sort.is_unsorted() {
            id_sort(self.mapping())
        } else {
            request.sort.clone()
        };
        let content = self.query_rows(predicate, &sort, Window::from(request))?;

        Ok(Page {
            content,
            page: request.page,
            size: request.size,
            total_elements,
        })
    }

    /// Finds the single entity matching `predicate`.
    fn find_one(&self, predicate: Predicate) -> RepoResult<Option<Self::Entity>> {
        let mut rows =
            self.query_rows(Some(predicate.clone()), &Sort::unsorted(), Window::first(2))?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            _ => Err(RepoError::IncorrectResultSize {
                expected: 1,
                actual: self.count_matching(Some(predicate))?,
            }),
        }
    }

    fn count(&self) -> RepoResult<u64> {
        self.count_matching(None)
    }

    fn count_matching(&self, predicate: Option<Predicate>) -> RepoResult<u64> {
        self.query_count(predicate)
    }
}

/// Ascending order over the id columns of `mapping`.
pub(crate) fn id_sort<M: EntityMapping>(mapping: &M) -> Sort {
    mapping
        .id_attribute_names()
        .iter()
        .fold(Sort::unsorted(), |sort, name| sort.then_asc(*name))
}

fn example_predicate<M: EntityMapping>(mapping: &M, example: &M::Entity) -> Predicate {
    let terms = mapping
        .columns()
        .iter()
        .zip(mapping.to_values(example))
        .filter(|(column, value)| **column != REMOVED_AT_COLUMN && *value != Value::Null)
        .map(|(column, value)| Predicate::eq(*column, value));
    Predicate::all(terms)
}
