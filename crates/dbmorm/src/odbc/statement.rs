//! Prepared statement wrapper bound to a connection's handle.

use super::handle::{NativeHandle, StatementResult};
use super::run_blocking;
use crate::config::DriverOptions;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Longest SQL prefix written to the debug log.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
const LOG_SQL_MAX_BYTES: usize = 200;

/// Statement text bound to a native handle and its driver options.
///
/// Created by [`Connection::prepare`](super::Connection::prepare); nothing runs
/// until [`Statement::execute`].
pub struct Statement<H: NativeHandle> {
    handle: Arc<H>,
    sql: String,
    options: DriverOptions,
}

impl<H: NativeHandle> Statement<H> {
    pub(crate) fn new(handle: Arc<H>, sql: String, options: DriverOptions) -> Self {
        Self {
            handle,
            sql,
            options,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Execute with positional parameters.
    ///
    /// Raw expression markers are not bindable and are rejected here.
    pub async fn execute(&self, params: &[Value]) -> OrmResult<StatementResult> {
        if let Some(raw) = params.iter().find(|v| !v.is_bindable()) {
            return Err(OrmError::execution(format!(
                "raw expression `{raw}` cannot be bound as a parameter"
            )));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "dbmorm.sql",
            param_count = params.len(),
            sql = %truncate_sql(&self.sql, LOG_SQL_MAX_BYTES),
        );

        let sql = self.sql.clone();
        let params = params.to_vec();
        let options = self.options.clone();
        run_blocking(&self.handle, move |h| h.execute(&sql, &params, &options)).await
    }
}

impl<H: NativeHandle> fmt::Debug for Statement<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
fn truncate_sql(sql: &str, max_bytes: usize) -> String {
    if sql.len() <= max_bytes {
        return sql.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}
