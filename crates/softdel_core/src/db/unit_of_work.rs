//! Transaction scope for multi-statement repository operations.
//!
//! # Responsibility
//! - Run a closure atomically on a shared connection.
//!
//! # Invariants
//! - An outer transaction opened by the caller is joined, never nested.
//! - Work that returns `Err` leaves no partial writes behind.

use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `work` atomically.
///
/// Joins the caller's transaction when one is already open on `conn`;
/// otherwise opens an immediate transaction, commits it when `work`
/// succeeds and rolls it back (on drop) when `work` fails.
pub fn in_unit_of_work<T, E>(
    conn: &Connection,
    work: impl FnOnce(&Connection) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<rusqlite::Error>,
{
    if !conn.is_autocommit() {
        return work(conn);
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}
