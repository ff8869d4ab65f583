//! Identity and deletion-filter predicate construction.
//!
//! # Responsibility
//! - Build the condition selecting exactly one entity by id, for simple and
//!   composite keys alike.
//! - Build the live/removed filter and conjoin it with caller predicates.
//!
//! # Invariants
//! - Absent id values fail with `InvalidArgument` before any SQL exists.
//! - `compose` returns a new predicate; its result is the only value a
//!   caller may pass on.

use super::predicate::Predicate;
use crate::model::entity::EntityMetadata;
use crate::model::REMOVED_AT_COLUMN;
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;

/// Builds the predicate matching the row identified by `id`.
pub fn identity_predicate<M: EntityMetadata>(metadata: &M, id: &M::Id) -> RepoResult<Predicate> {
    let names = metadata.id_attribute_names();

    if metadata.has_composite_id() {
        let terms = names
            .iter()
            .map(|name| {
                let value = required(
                    metadata.extract_composite_component(id, name),
                    metadata,
                    name,
                )?;
                Ok(Predicate::eq(*name, value))
            })
            .collect::<RepoResult<Vec<_>>>()?;
        return Ok(Predicate::And(terms));
    }

    let [name] = names else {
        return Err(RepoError::InvalidArgument(format!(
            "{} declares no id attribute",
            metadata.entity_type_name()
        )));
    };
    let value = required(metadata.id_value(id), metadata, name)?;
    Ok(Predicate::eq(*name, value))
}

/// Builds one membership predicate matching every row in `ids`.
pub fn batch_identity_predicate<M: EntityMetadata>(
    metadata: &M,
    ids: &[M::Id],
) -> RepoResult<Predicate> {
    let names = metadata.id_attribute_names();
    if names.is_empty() {
        return Err(RepoError::InvalidArgument(format!(
            "{} declares no id attribute",
            metadata.entity_type_name()
        )));
    }

    let rows = ids
        .iter()
        .map(|id| id_row(metadata, id))
        .collect::<RepoResult<Vec<_>>>()?;

    Ok(Predicate::In {
        columns: names.iter().map(|name| name.to_string()).collect(),
        rows,
    })
}

/// `removed_at IS NULL` for live rows, `removed_at IS NOT NULL` when
/// `include_deleted` selects removed rows instead.
pub fn deletion_filter(include_deleted: bool) -> Predicate {
    if include_deleted {
        Predicate::is_not_null(REMOVED_AT_COLUMN)
    } else {
        Predicate::is_null(REMOVED_AT_COLUMN)
    }
}

/// Conjoins `base` with `filter`.
///
/// A filter that is already a top-level conjunct of `base` is not appended
/// a second time.
pub fn compose(base: Option<Predicate>, filter: Predicate) -> Predicate {
    match base {
        None => filter,
        Some(base) if filter.conjuncts().iter().all(|term| base.conjuncts().contains(term)) => {
            base
        }
        Some(base) => base.and(filter),
    }
}

fn id_row<M: EntityMetadata>(metadata: &M, id: &M::Id) -> RepoResult<Vec<Value>> {
    let names = metadata.id_attribute_names();
    if !metadata.has_composite_id() {
        let value = required(metadata.id_value(id), metadata, names[0])?;
        return Ok(vec![value]);
    }

    names
        .iter()
        .map(|name| required(metadata.extract_composite_component(id, name), metadata, name))
        .collect()
}

fn required<M: EntityMetadata>(
    value: Option<Value>,
    metadata: &M,
    attribute: &str,
) -> RepoResult<Value> {
    match value {
        Some(Value::Null) | None => Err(RepoError::InvalidArgument(format!(
            "{} id attribute `{attribute}` must not be null",
            metadata.entity_type_name()
        ))),
        Some(value) => Ok(value),
    }
}
