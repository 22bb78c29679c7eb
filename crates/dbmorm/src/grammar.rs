//! SQL compilation for the query builder.
//!
//! A [`Grammar`] turns a [`QuerySnapshot`] (and, for inserts, an
//! [`InsertBatch`]) into statement text with `?` placeholders. The builder
//! never writes SQL itself.

use crate::error::{OrmError, OrmResult};
use crate::qb::{InsertBatch, QuerySnapshot};
use crate::value::Value;

/// Statement text plus its positional bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledSql {
    pub sql: String,
    pub bindings: Vec<Value>,
}

/// Compiles builder state into dialect SQL.
pub trait Grammar: Send + Sync {
    fn compile_select(&self, query: &QuerySnapshot) -> CompiledSql;

    /// A probe whose first row, if any, has a truthy first column.
    fn compile_exists(&self, query: &QuerySnapshot) -> CompiledSql;

    /// A multi-row INSERT. Bindings come from the batch, not from here.
    fn compile_insert(&self, query: &QuerySnapshot, batch: &InsertBatch) -> OrmResult<String>;
}

/// DBMaker SQL.
///
/// Identifiers are emitted as written so the server's `DB_IDCap` folding
/// applies to them. Raw values are inlined in place of a placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbMakerGrammar;

impl DbMakerGrammar {
    fn where_clause(query: &QuerySnapshot, sql: &mut String) -> Vec<Value> {
        let (clause, bindings) = query.wheres().build();
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        bindings
    }
}

impl Grammar for DbMakerGrammar {
    fn compile_select(&self, query: &QuerySnapshot) -> CompiledSql {
        let columns = if query.columns().is_empty() {
            "*".to_string()
        } else {
            query.columns().join(", ")
        };
        let mut sql = format!("SELECT {columns} FROM {}", query.table());
        let bindings = Self::where_clause(query, &mut sql);

        if !query.orders().is_empty() {
            let orders: Vec<String> = query
                .orders()
                .iter()
                .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }
        if let Some(limit) = query.limit() {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = query.offset() {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        CompiledSql { sql, bindings }
    }

    fn compile_exists(&self, query: &QuerySnapshot) -> CompiledSql {
        let mut sql = format!("SELECT 1 FROM {}", query.table());
        let bindings = Self::where_clause(query, &mut sql);
        sql.push_str(" LIMIT 1");
        CompiledSql { sql, bindings }
    }

    fn compile_insert(&self, query: &QuerySnapshot, batch: &InsertBatch) -> OrmResult<String> {
        if batch.width() == 0 {
            return Err(OrmError::validation("INSERT requires at least one column"));
        }
        let columns = batch.columns().collect::<Vec<_>>().join(", ");
        let rows: Vec<String> = batch
            .rows()
            .iter()
            .map(|row| {
                let marks: Vec<String> = row
                    .values()
                    .map(|v| match v {
                        Value::Raw(sql) => sql.clone(),
                        _ => "?".to_string(),
                    })
                    .collect();
                format!("({})", marks.join(", "))
            })
            .collect();
        Ok(format!(
            "INSERT INTO {} ({columns}) VALUES {}",
            query.table(),
            rows.join(", ")
        ))
    }
}
