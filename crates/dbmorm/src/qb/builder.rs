//! The DBMaker query builder.

use super::chunk::{ChunkControl, ChunkOutcome, PageCursor};
use super::expr::Expr;
use super::insert::{InsertBatch, InsertRows};
use super::pluck::{KeyedValues, Plucked, pluck_rows, strip_table_for_pluck};
use super::snapshot::{Direction, QuerySnapshot};
use crate::client::GenericClient;
use crate::config::IdCap;
use crate::error::{OrmError, OrmResult};
use crate::grammar::{CompiledSql, DbMakerGrammar, Grammar};
use crate::processor::{DbMakerProcessor, Processor};
use crate::row::RowSet;
use crate::value::Value;
use std::fmt;

/// A capability the dialect lacks, recorded instead of failing the call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Unsupported {
    /// `in_random_order` was requested; the query is left unordered.
    RandomOrder { seed: String },
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsupported::RandomOrder { seed } if seed.is_empty() => {
                f.write_str("random ordering is not supported")
            }
            Unsupported::RandomOrder { seed } => {
                write!(f, "random ordering (seed {seed}) is not supported")
            }
        }
    }
}

/// Query builder bound to one client, grammar and processor.
///
/// `DB_IDCap` is read from the client once, at construction. When it is on,
/// result columns are matched ASCII-case-insensitively.
pub struct Builder<'c, C, G = DbMakerGrammar, P = DbMakerProcessor> {
    conn: &'c C,
    grammar: G,
    processor: P,
    id_cap: IdCap,
    query: QuerySnapshot,
    use_write_connection: bool,
    unsupported: Vec<Unsupported>,
}

impl<'c, C: GenericClient> Builder<'c, C> {
    /// A builder for `table` with the DBMaker grammar and processor.
    pub fn new(conn: &'c C, table: impl Into<String>) -> Self {
        Self::with_parts(conn, table, DbMakerGrammar, DbMakerProcessor::default())
    }
}

impl<'c, C, G, P> Builder<'c, C, G, P>
where
    C: GenericClient,
    G: Grammar,
    P: Processor,
{
    pub fn with_parts(conn: &'c C, table: impl Into<String>, grammar: G, processor: P) -> Self {
        Self {
            conn,
            grammar,
            processor,
            id_cap: conn.id_cap(),
            query: QuerySnapshot::new(table),
            use_write_connection: false,
            unsupported: Vec::new(),
        }
    }

    pub fn id_cap(&self) -> IdCap {
        self.id_cap
    }

    /// Capabilities that were requested but could not be honored.
    pub fn unsupported(&self) -> &[Unsupported] {
        &self.unsupported
    }

    pub fn snapshot(&self) -> &QuerySnapshot {
        &self.query
    }

    // ==================== query intent ====================

    /// Set the selected columns.
    pub fn select<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.query.set_columns(columns);
        self
    }

    /// Add a WHERE condition built with [`Expr`].
    pub fn where_expr(mut self, expr: Expr) -> Self {
        self.query.push_where(expr);
        self
    }

    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_expr(Expr::eq(column, value))
    }

    pub fn where_ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_expr(Expr::ne(column, value))
    }

    pub fn where_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_expr(Expr::gt(column, value))
    }

    pub fn where_gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_expr(Expr::gte(column, value))
    }

    pub fn where_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_expr(Expr::lt(column, value))
    }

    pub fn where_lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_expr(Expr::lte(column, value))
    }

    pub fn where_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_expr(Expr::in_list(column, values))
    }

    pub fn where_null(self, column: &str) -> Self {
        self.where_expr(Expr::is_null(column))
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.where_expr(Expr::is_not_null(column))
    }

    /// Raw condition with `?` placeholders bound to `bindings`.
    pub fn where_raw<V: Into<Value>>(self, sql: &str, bindings: impl IntoIterator<Item = V>) -> Self {
        self.where_expr(Expr::template(sql, bindings))
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.query.push_order(column, Direction::Asc);
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.query.push_order(column, Direction::Desc);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.set_limit(Some(limit));
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query.set_offset(Some(offset));
        self
    }

    /// Send reads through the write connection.
    pub fn use_write_connection(mut self) -> Self {
        self.use_write_connection = true;
        self
    }

    /// Request random ordering.
    ///
    /// DBMaker has no random ordering this builder can emit, so the compiled
    /// query is left unchanged and [`Unsupported::RandomOrder`] is recorded.
    pub fn in_random_order(mut self, seed: &str) -> Self {
        let marker = Unsupported::RandomOrder {
            seed: seed.to_string(),
        };
        #[cfg(feature = "tracing")]
        tracing::warn!(target: "dbmorm", table = self.query.table(), "{marker}; ignoring");
        self.unsupported.push(marker);
        self
    }

    // ==================== compile ====================

    pub fn to_sql(&self) -> String {
        self.grammar.compile_select(&self.query).sql
    }

    pub fn bindings(&self) -> Vec<Value> {
        self.grammar.compile_select(&self.query).bindings
    }

    // ==================== execute ====================

    async fn run_select(&self, query: &QuerySnapshot) -> OrmResult<RowSet> {
        let CompiledSql { sql, bindings } = self.grammar.compile_select(query);
        let rows = self
            .conn
            .select(&sql, &bindings, !self.use_write_connection)
            .await?;
        Ok(self.processor.process_select(query, rows))
    }

    /// Columns to use for a one-off read: the builder's own, else `columns`.
    fn with_default_columns(&self, columns: &[&str]) -> QuerySnapshot {
        let star = columns.is_empty() || columns == ["*"];
        if self.query.columns().is_empty() && !star {
            self.query.with_columns(columns.iter().copied())
        } else {
            self.query.clone()
        }
    }

    /// Run the query and return every row.
    pub async fn get(&self) -> OrmResult<RowSet> {
        self.run_select(&self.query).await
    }

    /// The first row, if any, as a one-row set.
    pub async fn first(&self, columns: &[&str]) -> OrmResult<Option<RowSet>> {
        let mut query = self.with_default_columns(columns);
        query.set_limit(Some(1));
        Ok(self.run_select(&query).await?.into_first())
    }

    /// The row whose `id` equals `id`; `None` when there is none.
    pub async fn find(&self, id: impl Into<Value>, columns: &[&str]) -> OrmResult<Option<RowSet>> {
        let mut query = self.with_default_columns(columns);
        query.push_where(Expr::eq("id", id));
        query.set_limit(Some(1));
        Ok(self.run_select(&query).await?.into_first())
    }

    /// Whether the query matches any row.
    pub async fn exists(&self) -> OrmResult<bool> {
        let CompiledSql { sql, bindings } = self.grammar.compile_exists(&self.query);
        let rows = self
            .conn
            .select(&sql, &bindings, !self.use_write_connection)
            .await?;
        let results = self.processor.process_select(&self.query, rows);
        Ok(results.first_scalar().is_some_and(Value::is_truthy))
    }

    /// Insert one row or a batch; empty input succeeds without a round trip.
    pub async fn insert(&self, rows: impl Into<InsertRows>) -> OrmResult<bool> {
        let Some(batch) = InsertBatch::normalize(rows)? else {
            return Ok(true);
        };
        let sql = self.grammar.compile_insert(&self.query, &batch)?;
        let bindings = batch.chunked_bindings().concat();
        self.conn.insert(&sql, &bindings).await
    }

    /// Insert and return the generated key.
    ///
    /// `sequence` names the sequence to read the key from; without it the
    /// processor's default key source is used.
    pub async fn insert_get_id(
        &self,
        row: impl Into<InsertRows>,
        sequence: Option<&str>,
    ) -> OrmResult<i64> {
        let batch = InsertBatch::normalize(row)?
            .ok_or_else(|| OrmError::validation("insert_get_id requires at least one column"))?;
        let sql = self.grammar.compile_insert(&self.query, &batch)?;
        let bindings = batch.row_bindings().concat();
        self.processor
            .process_insert_get_id(self.conn, &sql, &bindings, sequence)
            .await
    }

    /// Page through the query by ascending `id`, `count` rows at a time.
    pub async fn chunk_by_id<F, R>(&self, count: u64, callback: F) -> OrmResult<ChunkOutcome>
    where
        F: FnMut(RowSet) -> R,
        R: Into<ChunkControl>,
    {
        self.chunk_by_id_with(count, "id", None, callback).await
    }

    /// Page through the query by ascending `column`, `count` rows at a time.
    ///
    /// `column` is upper-cased. The cursor is read from `alias` on each page's
    /// last row; `alias` defaults to the upper-cased column. A callback
    /// returning `false` stops the scan with [`ChunkOutcome::Stopped`].
    pub async fn chunk_by_id_with<F, R>(
        &self,
        count: u64,
        column: &str,
        alias: Option<&str>,
        mut callback: F,
    ) -> OrmResult<ChunkOutcome>
    where
        F: FnMut(RowSet) -> R,
        R: Into<ChunkControl>,
    {
        if count == 0 {
            return Err(OrmError::validation("chunk size must be at least 1"));
        }
        let mut cursor = PageCursor::new(column, count);
        let alias = alias.map_or_else(|| cursor.column().to_string(), str::to_string);

        loop {
            let page = self.query.for_page_after_id(
                count,
                cursor.last_id(),
                cursor.column(),
                self.id_cap.folds_case(),
            );
            let results = self.run_select(&page).await?;
            let fetched = results.len();
            if fetched == 0 {
                break;
            }

            let last_id = results.last_value(&alias, self.id_cap.folds_case()).cloned();
            let control: ChunkControl = callback(results).into();
            if control == ChunkControl::Stop {
                return Ok(ChunkOutcome::Stopped);
            }
            if !cursor.page_was_full(fetched) {
                break;
            }
            match last_id {
                Some(id) => cursor.advance(id),
                None => {
                    return Err(OrmError::decode(
                        alias,
                        "cursor column missing from the last row of a page",
                    ));
                }
            }
        }
        Ok(ChunkOutcome::Completed)
    }

    /// Values of `column`, optionally keyed by `key`.
    ///
    /// Only the plucked columns are selected; the builder's own column list
    /// is left as it was.
    pub async fn pluck(&self, column: &str, key: Option<&str>) -> OrmResult<Plucked> {
        let columns = match key {
            None => vec![column],
            Some(key) => vec![column, key],
        };
        let query = self.query.with_columns(columns);
        let results = self.run_select(&query).await?;
        if results.is_empty() {
            return Ok(match key {
                None => Plucked::Values(Vec::new()),
                Some(_) => Plucked::Keyed(KeyedValues::new()),
            });
        }

        let column = strip_table_for_pluck(column);
        let key = key.map(strip_table_for_pluck);
        Ok(pluck_rows(&results, column, key, self.id_cap.folds_case()))
    }
}

impl<C, G: fmt::Debug, P: fmt::Debug> fmt::Debug for Builder<'_, C, G, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("grammar", &self.grammar)
            .field("processor", &self.processor)
            .field("id_cap", &self.id_cap)
            .field("query", &self.query)
            .field("use_write_connection", &self.use_write_connection)
            .field("unsupported", &self.unsupported)
            .finish_non_exhaustive()
    }
}
