//! Query intent as a plain value.
//!
//! A [`QuerySnapshot`] is everything a grammar needs to compile a SELECT. The
//! builder copies it before each chunk page and each pluck, so paging
//! predicates and column overrides never leak back into the caller's query.

use super::expr::{Expr, ExprGroup};
use crate::value::Value;

/// Sort direction of one ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// Table, projection, predicates, ordering and paging of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot {
    table: String,
    columns: Vec<String>,
    wheres: ExprGroup,
    orders: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QuerySnapshot {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            wheres: ExprGroup::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Selected columns; empty means `*`.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn wheres(&self) -> &ExprGroup {
        &self.wheres
    }

    pub fn orders(&self) -> &[OrderBy] {
        &self.orders
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn set_columns<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) {
        self.columns = columns.into_iter().map(Into::into).collect();
    }

    pub fn push_where(&mut self, expr: Expr) {
        self.wheres.push(expr);
    }

    pub fn push_order(&mut self, column: impl Into<String>, direction: Direction) {
        self.orders.push(OrderBy {
            column: column.into(),
            direction,
        });
    }

    pub fn set_limit(&mut self, limit: Option<u64>) {
        self.limit = limit;
    }

    pub fn set_offset(&mut self, offset: Option<u64>) {
        self.offset = offset;
    }

    /// A copy with only `columns` selected.
    pub fn with_columns<S: Into<String>>(&self, columns: impl IntoIterator<Item = S>) -> Self {
        let mut copy = self.clone();
        copy.set_columns(columns);
        copy
    }

    /// A copy restricted to the page of `count` rows after `last_id` on `column`.
    ///
    /// Existing orderings on `column` are replaced by a single ascending one;
    /// with `ignore_case` they are matched ASCII-case-insensitively. With no
    /// `last_id` the first page is selected.
    pub fn for_page_after_id(
        &self,
        count: u64,
        last_id: Option<&Value>,
        column: &str,
        ignore_case: bool,
    ) -> Self {
        let mut page = self.clone();
        page.orders.retain(|o| {
            if ignore_case {
                !o.column.eq_ignore_ascii_case(column)
            } else {
                o.column != column
            }
        });
        if let Some(last) = last_id {
            page.push_where(Expr::gt(column, last.clone()));
        }
        page.push_order(column, Direction::Asc);
        page.limit = Some(count);
        page
    }
}
