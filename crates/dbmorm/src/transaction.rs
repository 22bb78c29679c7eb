//! Transaction helper macro.
//!
//! [`Connection::begin_transaction`](crate::odbc::Connection::begin_transaction)
//! turns autocommit off; [`commit`](crate::odbc::Connection::commit) and
//! [`roll_back`](crate::odbc::Connection::roll_back) end the unit of work. The
//! [`transaction!`] macro wires those together so every exit path leaves the
//! connection back in autocommit mode.
//!
//! # Example
//!
//! ```ignore
//! use dbmorm::{OrmResult, query};
//!
//! # async fn demo(conn: &dbmorm::odbc::Connection<dbmorm::odbc::OdbcHandle>) -> OrmResult<()> {
//! dbmorm::transaction!(conn, {
//!     query("UPDATE ACCOUNTS SET BALANCE = BALANCE - ? WHERE ID = ?")
//!         .bind(100_i64)
//!         .bind(1_i64)
//!         .execute(conn)
//!         .await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

/// Runs the given block inside a database transaction.
///
/// - Turns autocommit off via `$conn.begin_transaction().await`.
/// - Commits on `Ok(_)`, then turns autocommit back on.
/// - Rolls back on `Err(_)`; rollback always restores autocommit.
///
/// The block must evaluate to `dbmorm::OrmResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($conn:expr, $body:block) => {{
        let __dbmorm_conn = &$conn;
        __dbmorm_conn.begin_transaction().await?;

        let __dbmorm_tx_body_result = async { $body }.await;
        match __dbmorm_tx_body_result {
            Ok(value) => match __dbmorm_conn.commit().await {
                Ok(()) => {
                    __dbmorm_conn.end_transaction().await?;
                    Ok(value)
                }
                Err(commit_err) => match __dbmorm_conn.roll_back().await {
                    Ok(()) => Err(commit_err),
                    Err(rollback_err) => Err($crate::OrmError::Other(format!(
                        "{commit_err} (rollback failed: {rollback_err})"
                    ))),
                },
            },
            Err(error) => match __dbmorm_conn.roll_back().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}
