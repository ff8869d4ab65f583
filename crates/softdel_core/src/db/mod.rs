//! SQLite connection bootstrap and transaction scoping.
//!
//! # Responsibility
//! - Open and configure SQLite connections used by repositories.
//! - Provide the unit-of-work wrapper for multi-statement mutations.
//!
//! # Invariants
//! - Schema is owned by the host application; nothing here creates tables.
//! - A unit of work never nests a second `BEGIN` inside a caller transaction.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;
mod unit_of_work;

pub use open::{open_db, open_db_in_memory};
pub use unit_of_work::in_unit_of_work;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
