//! Predicate trees, statement builders and paging types.
//!
//! # Invariants
//! - Everything here is pure value construction; only statement
//!   `execute`/`query` helpers touch a connection.

pub mod composer;
pub mod page;
pub mod predicate;
pub mod statement;
