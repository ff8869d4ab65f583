//! Entity contracts consumed by the repository layer.
//!
//! # Responsibility
//! - Describe how an entity type is identified and persisted, without
//!   runtime introspection.
//!
//! # Invariants
//! - Tables served by a soft-delete repository carry the `removed_at` column.
//! - `removed_at IS NULL` means live; any other value is the removal time.

pub mod entity;

/// Name of the nullable epoch-millisecond deletion marker column.
pub const REMOVED_AT_COLUMN: &str = "removed_at";
