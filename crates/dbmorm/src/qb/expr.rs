//! Expression layer for WHERE clauses.
//!
//! `Expr` supports:
//! - AND/OR/NOT grouping
//! - comparison operators (eq, ne, gt, lt, like, ...)
//! - template expressions with `?` placeholders
//! - raw SQL fragments
//!
//! Every bindable value becomes a `?` placeholder and is appended to the
//! binding list in the same order. [`Value::Raw`] values are inlined into the
//! SQL text and never reach the binding list.

use crate::value::Value;

/// Expression node for building WHERE clauses.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// AND group: all conditions must be true.
    And(Vec<Expr>),

    /// OR group: at least one condition must be true.
    Or(Vec<Expr>),

    /// NOT: negate the inner expression.
    Not(Box<Expr>),

    /// Simple comparison: column op ?
    Compare {
        column: String,
        op: &'static str,
        value: Value,
    },

    /// NULL check: column IS NULL or column IS NOT NULL
    NullCheck { column: String, is_null: bool },

    /// IN list: column IN (?, ?, ...) or column NOT IN (...)
    InList {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },

    /// BETWEEN: column BETWEEN ? AND ?
    Between {
        column: String,
        from: Value,
        to: Value,
    },

    /// SQL text with `?` placeholders and their values.
    Template { sql: String, params: Vec<Value> },

    /// Raw SQL fragment without parameters.
    Raw(String),

    /// Always true (used for empty NOT IN lists).
    True,

    /// Always false (used for empty IN lists).
    False,
}

impl Expr {
    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    fn compare(column: impl Into<String>, op: &'static str, value: impl Into<Value>) -> Self {
        Expr::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// column = value
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "=", value)
    }

    /// column <> value
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<>", value)
    }

    /// column > value
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, ">", value)
    }

    /// column >= value
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, ">=", value)
    }

    /// column < value
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<", value)
    }

    /// column <= value
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<=", value)
    }

    /// column LIKE pattern
    pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, "LIKE", pattern)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: true,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: false,
        }
    }

    /// column IN (values...); an empty list is always false.
    pub fn in_list<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Expr::False;
        }
        Expr::InList {
            column: column.into(),
            values,
            negated: false,
        }
    }

    /// column NOT IN (values...); an empty list is always true.
    pub fn not_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Expr::True;
        }
        Expr::InList {
            column: column.into(),
            values,
            negated: true,
        }
    }

    pub fn between(
        column: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// SQL text whose `?` marks are bound to `params` in order.
    pub fn template<V: Into<Value>>(
        sql: impl Into<String>,
        params: impl IntoIterator<Item = V>,
    ) -> Self {
        Expr::Template {
            sql: sql.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// Check if this expression is empty (contains no conditions).
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::And(exprs) | Expr::Or(exprs) => exprs.iter().all(Expr::is_empty),
            Expr::Not(inner) => inner.is_empty(),
            _ => false,
        }
    }

    /// Build the SQL fragment, appending bindable values to `params`.
    pub fn build(&self, params: &mut Vec<Value>) -> String {
        match self {
            Expr::And(exprs) => join_group(exprs, " AND ", params),
            Expr::Or(exprs) => join_group(exprs, " OR ", params),
            Expr::Not(inner) => {
                let sql = inner.build(params);
                if sql.is_empty() {
                    sql
                } else {
                    format!("NOT ({sql})")
                }
            }
            Expr::Compare { column, op, value } => {
                format!("{column} {op} {}", placeholder(value, params))
            }
            Expr::NullCheck { column, is_null } => {
                if *is_null {
                    format!("{column} IS NULL")
                } else {
                    format!("{column} IS NOT NULL")
                }
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                let marks: Vec<String> = values.iter().map(|v| placeholder(v, params)).collect();
                let op = if *negated { "NOT IN" } else { "IN" };
                format!("{column} {op} ({})", marks.join(", "))
            }
            Expr::Between { column, from, to } => {
                let from = placeholder(from, params);
                let to = placeholder(to, params);
                format!("{column} BETWEEN {from} AND {to}")
            }
            Expr::Template {
                sql,
                params: template_params,
            } => {
                let mut out = String::with_capacity(sql.len());
                let mut values = template_params.iter();
                for ch in sql.chars() {
                    if ch == '?' {
                        if let Some(value) = values.next() {
                            out.push_str(&placeholder(value, params));
                            continue;
                        }
                    }
                    out.push(ch);
                }
                out
            }
            Expr::Raw(sql) => sql.clone(),
            Expr::True => "1=1".to_string(),
            Expr::False => "1=0".to_string(),
        }
    }
}

/// `?` for bindable values, inline text for raw expressions.
fn placeholder(value: &Value, params: &mut Vec<Value>) -> String {
    match value {
        Value::Raw(sql) => sql.clone(),
        other => {
            params.push(other.clone());
            "?".to_string()
        }
    }
}

fn join_group(exprs: &[Expr], sep: &str, params: &mut Vec<Value>) -> String {
    exprs
        .iter()
        .filter(|e| !e.is_empty())
        .map(|e| {
            let sql = e.build(params);
            // nested groups of the other kind need parentheses
            let nested = matches!(e, Expr::And(_) | Expr::Or(_));
            if nested && !sql.is_empty() {
                format!("({sql})")
            } else {
                sql
            }
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// WHERE conditions joined with AND.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExprGroup {
    exprs: Vec<Expr>,
}

impl ExprGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.iter().all(Expr::is_empty)
    }

    /// Add an expression to be ANDed.
    pub fn push(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    /// Build the WHERE clause content (without the `WHERE` keyword).
    pub fn build(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let sql = join_group(&self.exprs, " AND ", &mut params);
        (sql, params)
    }
}
