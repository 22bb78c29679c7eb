//! # dbmorm
//!
//! A DBMaker dialect adapter: a connection bridge over a native ODBC handle and
//! a query builder that compiles DBMaker SQL.
//!
//! ## Features
//!
//! - **Connection bridge**: prepare/execute, transactions, and a rollback that
//!   always restores autocommit
//! - **Query builder**: key-sorted batch inserts, generated keys, `exists`,
//!   ID paging, plucking and `find`
//! - **Identifier case**: result columns follow the connection's `DB_IDCap`
//! - **SQL explicit**: hand-written SQL via `query()` with `?` parameters
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use dbmorm::{Connection, DriverOptions, qb};
//!
//! let conn = Connection::connect("DBSAMPLE", "SYSADM", "", DriverOptions::new()).await?;
//!
//! let id = qb::table(&conn, "USERS")
//!     .insert_get_id(qb::InsertRow::new().set("NAME", "alice"), None)
//!     .await?;
//!
//! let found = qb::table(&conn, "USERS").find(id, &["*"]).await?;
//!
//! let names = qb::table(&conn, "USERS")
//!     .where_eq("ACTIVE", 1)
//!     .pluck("NAME", Some("ID"))
//!     .await?;
//! ```
//!
//! ## Transactions
//!
//! ```ignore
//! dbmorm::transaction!(conn, {
//!     conn.exec("UPDATE ACCOUNTS SET BALANCE = BALANCE - 10 WHERE ID = 1").await?;
//!     conn.exec("UPDATE ACCOUNTS SET BALANCE = BALANCE + 10 WHERE ID = 2").await?;
//!     Ok::<(), dbmorm::OrmError>(())
//! })?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod grammar;
pub mod ident;
pub mod odbc;
pub mod processor;
pub mod qb;
pub mod query;
pub mod row;
pub mod transaction;
pub mod value;

pub use client::GenericClient;
pub use config::{ConnectOptions, DB_IDCAP, DriverOptions, IdCap};
pub use error::{OrmError, OrmResult};
pub use grammar::{CompiledSql, DbMakerGrammar, Grammar};
pub use ident::Ident;
pub use odbc::{Connection, NativeHandle, Statement, StatementResult};
pub use processor::{DbMakerProcessor, FetchMode, Processor};
pub use query::{Query, query};
pub use row::{FromRow, FromValue, Record, Row, RowAccess, RowSet};
pub use value::{Value, clean_bindings};

// Re-export qb module for easy access
pub use qb::{
    Builder, ChunkControl, ChunkOutcome, Expr, ExprGroup, InsertRow, KeyedValues, Plucked,
    Unsupported,
};

#[cfg(feature = "odbc")]
pub use odbc::OdbcHandle;
