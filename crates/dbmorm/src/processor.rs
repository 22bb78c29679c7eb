//! Result interpretation for the query builder.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::qb::QuerySnapshot;
use crate::row::{Row, RowSet};
use crate::value::Value;

/// Turns driver rows into builder results and fetches generated keys.
pub trait Processor: Send + Sync {
    /// Shape the rows of a SELECT.
    fn process_select(&self, query: &QuerySnapshot, rows: Vec<Row>) -> RowSet;

    /// Run an INSERT and return the key it generated.
    fn process_insert_get_id<C: GenericClient>(
        &self,
        client: &C,
        sql: &str,
        bindings: &[Value],
        sequence: Option<&str>,
    ) -> impl std::future::Future<Output = OrmResult<i64>> + Send;
}

/// Row shape produced by [`DbMakerProcessor::process_select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Positional rows sharing a column list.
    #[default]
    Rows,
    /// Name/value records.
    Records,
}

/// DBMaker result handling.
///
/// Generated keys are read back from `SYSCONINFO` on the same connection:
/// `LAST_SERIAL` for SERIAL columns, `<sequence>.CURRVAL` when a sequence is
/// named.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbMakerProcessor {
    fetch_mode: FetchMode,
}

impl DbMakerProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    /// The statement that reads back the last generated key.
    pub fn last_id_sql(sequence: Option<&str>) -> OrmResult<String> {
        match sequence {
            None => Ok("SELECT LAST_SERIAL FROM SYSCONINFO".to_string()),
            Some(name) => {
                let ident = Ident::parse(name)
                    .map_err(|e| OrmError::processor(format!("invalid sequence name: {e}")))?;
                Ok(format!("SELECT {}.CURRVAL FROM SYSCONINFO", ident.to_sql()))
            }
        }
    }
}

impl Processor for DbMakerProcessor {
    fn process_select(&self, _query: &QuerySnapshot, rows: Vec<Row>) -> RowSet {
        match self.fetch_mode {
            FetchMode::Rows => RowSet::Rows(rows),
            FetchMode::Records => RowSet::Records(rows.into_iter().map(Row::into_record).collect()),
        }
    }

    async fn process_insert_get_id<C: GenericClient>(
        &self,
        client: &C,
        sql: &str,
        bindings: &[Value],
        sequence: Option<&str>,
    ) -> OrmResult<i64> {
        let id_sql = Self::last_id_sql(sequence)?;
        client.insert(sql, bindings).await?;

        let row = client
            .query_opt(&id_sql, &[])
            .await?
            .ok_or_else(|| OrmError::processor("no generated key returned"))?;
        let value = row
            .values()
            .first()
            .ok_or_else(|| OrmError::processor("generated key row has no columns"))?;
        value.as_i64().ok_or_else(|| {
            OrmError::processor(format!("generated key is not an integer: {value:?}"))
        })
    }
}
