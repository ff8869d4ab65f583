//! Soft-delete repository configuration.
//!
//! Hosts usually embed [`SoftDeleteConfig`] in their own config file; every
//! field has a default, so an empty object decodes to the defaults.

use serde::{Deserialize, Serialize};

/// Which rows a delete path may stamp with `removed_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalScope {
    /// Only live rows; the first removal timestamp is kept.
    #[default]
    LiveOnly,
    /// Any matching row; already removed rows are stamped again.
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftDeleteConfig {
    pub removal_scope: RemovalScope,
    /// Check at construction that the table and mapped columns exist.
    pub verify_schema: bool,
}

impl Default for SoftDeleteConfig {
    fn default() -> Self {
        Self {
            removal_scope: RemovalScope::LiveOnly,
            verify_schema: true,
        }
    }
}
