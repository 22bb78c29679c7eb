//! DBMaker query builder.
//!
//! [`Builder`] accumulates query intent for one table and drives
//! compile → execute → process through a [`Grammar`](crate::Grammar), a
//! [`GenericClient`](crate::GenericClient) and a
//! [`Processor`](crate::Processor).
//!
//! # Features
//!
//! - **Batch inserts**: rows are key-sorted and bound as one flat parameter list
//! - **ID paging**: `chunk_by_id` walks a table by an increasing key column
//! - **Plucking**: one column as a list, or keyed by a second column
//! - **Case policy**: result columns follow the connection's `DB_IDCap`
//!
//! # Usage
//!
//! ```ignore
//! use dbmorm::qb::{Builder, InsertRow};
//!
//! let users = Builder::new(&conn, "USERS");
//!
//! users
//!     .insert(vec![
//!         InsertRow::new().set("NAME", "b").set("ID", 2),
//!         InsertRow::new().set("ID", 1).set("NAME", "a"),
//!     ])
//!     .await?;
//!
//! let names = users.pluck("NAME", Some("ID")).await?;
//!
//! users
//!     .chunk_by_id(100, |page| {
//!         println!("{} rows", page.len());
//!         true
//!     })
//!     .await?;
//! ```

mod builder;
mod chunk;
mod expr;
mod insert;
mod pluck;
mod snapshot;

pub use builder::{Builder, Unsupported};
pub use chunk::{ChunkControl, ChunkOutcome, PageCursor};
pub use expr::{Expr, ExprGroup};
pub use insert::{InsertBatch, InsertRow, InsertRows};
pub use pluck::{KeyedValues, Plucked, strip_table_for_pluck};
pub use snapshot::{Direction, OrderBy, QuerySnapshot};

/// Create a builder for `table` with the DBMaker grammar and processor.
///
/// # Example
/// ```ignore
/// let exists = dbmorm::qb::table(&conn, "USERS").where_eq("ID", 1).exists().await?;
/// ```
pub fn table<'c, C: crate::GenericClient>(conn: &'c C, table: &str) -> Builder<'c, C> {
    Builder::new(conn, table)
}

#[cfg(test)]
mod tests;
