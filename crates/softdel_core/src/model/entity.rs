//! Entity metadata and row mapping traits.
//!
//! Implementations are supplied per entity type when a repository is built
//! (see `repo::factory`). Both simple and composite identifiers are expressed
//! through the same methods; the repository never assumes which one it has.

use rusqlite::types::Value;
use rusqlite::Row;
use std::fmt::Debug;

/// Identity facts about one entity type.
pub trait EntityMetadata {
    /// Persisted record type.
    type Entity;
    /// Identifier type. Composite keys use a struct or tuple.
    type Id: Debug;

    /// Human-readable type name used in errors and log events.
    fn entity_type_name(&self) -> &str;

    /// Identifier column names, in key order. Never empty.
    fn id_attribute_names(&self) -> &[&'static str];

    /// Whether the identifier spans more than one column.
    fn has_composite_id(&self) -> bool {
        self.id_attribute_names().len() > 1
    }

    /// Extracts the identifier from an entity.
    ///
    /// Returns `None` for entities that have not been assigned an id.
    fn extract_id(&self, entity: &Self::Entity) -> Option<Self::Id>;

    /// Converts a simple identifier into its bound SQL value.
    fn id_value(&self, id: &Self::Id) -> Option<Value>;

    /// Extracts one component of a composite identifier by column name.
    fn extract_composite_component(&self, id: &Self::Id, name: &str) -> Option<Value>;
}

/// Column-level mapping between an entity type and its table.
pub trait EntityMapping: EntityMetadata {
    /// Backing table name.
    fn table_name(&self) -> &str;

    /// Every persisted column, including id columns and `removed_at`.
    fn columns(&self) -> &[&'static str];

    /// Values to bind for [`EntityMapping::columns`], in the same order.
    fn to_values(&self, entity: &Self::Entity) -> Vec<Value>;

    /// Decodes one row selected with [`EntityMapping::columns`].
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Self::Entity>;
}
