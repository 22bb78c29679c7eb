//! Lightweight query runner for hand-written SQL

use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::row::{FromRow, Row};
use crate::value::Value;

/// Hand-written SQL with positional `?` parameters.
///
/// # Example
///
/// ```ignore
/// use dbmorm::query;
///
/// let user: User = query("SELECT * FROM USERS WHERE ID = ?")
///     .bind(user_id)
///     .fetch_one_as(&conn)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    sql: String,
    params: Vec<Value>,
}

/// Create a new query with the given SQL
pub fn query(sql: impl Into<String>) -> Query {
    Query {
        sql: sql.into(),
        params: Vec::new(),
    }
}

impl Query {
    /// Bind the next `?` parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Execute the query and return all rows
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> OrmResult<Vec<Row>> {
        conn.query(&self.sql, &self.params).await
    }

    /// Execute the query and return all rows mapped to type T
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> OrmResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the query and return exactly one row
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> OrmResult<Row> {
        conn.query_one(&self.sql, &self.params).await
    }

    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> OrmResult<T> {
        let row = self.fetch_one(conn).await?;
        T::from_row(&row)
    }

    /// Execute the query and return at most one row
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> OrmResult<Option<Row>> {
        conn.query_opt(&self.sql, &self.params).await
    }

    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> OrmResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the statement and return the number of affected rows
    pub async fn execute(&self, conn: &impl GenericClient) -> OrmResult<u64> {
        conn.execute(&self.sql, &self.params).await
    }
}
