//! Generic client trait consumed by the query builder.

use crate::config::IdCap;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;

/// A trait that unifies database connections for the query builder.
///
/// [`Connection`](crate::odbc::Connection) implements it over a native ODBC
/// handle; tests and higher layers can supply their own implementation.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Run a SELECT, telling the client whether a read connection may be used.
    ///
    /// Routing between read and write connections belongs to the client; the
    /// default implementation ignores the flag and calls [`GenericClient::query`].
    fn select(
        &self,
        sql: &str,
        params: &[Value],
        use_read_connection: bool,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        let _ = use_read_connection;
        self.query(sql, params)
    }

    /// Run an INSERT and report success.
    fn insert(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<bool>> + Send {
        async move {
            self.execute(sql, params).await?;
            Ok(true)
        }
    }

    /// Execute a query and return the **first** row.
    ///
    /// Returns `OrmError::NotFound` if no rows are returned.
    fn query_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Row>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
        }
    }

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Identifier-case policy of the underlying connection.
    fn id_cap(&self) -> IdCap {
        IdCap::default()
    }
}

impl<C: GenericClient> GenericClient for &C {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (*self).query(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        (*self).execute(sql, params)
    }

    fn select(
        &self,
        sql: &str,
        params: &[Value],
        use_read_connection: bool,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (*self).select(sql, params, use_read_connection)
    }

    fn insert(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<bool>> + Send {
        (*self).insert(sql, params)
    }

    fn query_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Row>> + Send {
        (*self).query_one(sql, params)
    }

    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        (*self).query_opt(sql, params)
    }

    fn id_cap(&self) -> IdCap {
        (*self).id_cap()
    }
}
