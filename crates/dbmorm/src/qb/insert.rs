//! Insert payloads and batch normalization.
//!
//! A batch is sent as one statement with a flat parameter list, so every row
//! must carry the same columns in the same order. [`InsertBatch::normalize`]
//! sorts keys and rejects rows whose column set differs from the first row.

use crate::error::{OrmError, OrmResult};
use crate::value::{Value, clean_bindings};

/// One row to insert: ordered column/value pairs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InsertRow {
    values: Vec<(String, Value)>,
}

impl InsertRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing an earlier value for the same column.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(self, column: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().map(|(_, v)| v)
    }

    fn sort_keys(&mut self) {
        self.values.sort_by(|a, b| a.0.cmp(&b.0));
    }

    fn same_columns(&self, other: &InsertRow) -> bool {
        self.columns().eq(other.columns())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for InsertRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(InsertRow::new(), |row, (k, v)| row.set(k, v))
    }
}

/// Insert input: one flat row or a batch of rows.
#[derive(Clone, Debug, PartialEq)]
pub enum InsertRows {
    Single(InsertRow),
    Batch(Vec<InsertRow>),
}

impl From<InsertRow> for InsertRows {
    fn from(row: InsertRow) -> Self {
        InsertRows::Single(row)
    }
}

impl From<Vec<InsertRow>> for InsertRows {
    fn from(rows: Vec<InsertRow>) -> Self {
        InsertRows::Batch(rows)
    }
}

impl<const N: usize> From<[InsertRow; N]> for InsertRows {
    fn from(rows: [InsertRow; N]) -> Self {
        InsertRows::Batch(rows.into())
    }
}

/// A normalized, non-empty insert batch.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertBatch {
    rows: Vec<InsertRow>,
}

impl InsertBatch {
    /// Normalize insert input.
    ///
    /// Returns `Ok(None)` for empty input. A single row keeps its column order;
    /// batch rows are sorted by column name. A batch whose rows disagree on
    /// their column set, or whose first row is empty, is an execution error.
    pub fn normalize(rows: impl Into<InsertRows>) -> OrmResult<Option<Self>> {
        let rows = match rows.into() {
            InsertRows::Single(row) if row.is_empty() => return Ok(None),
            InsertRows::Single(row) => return Ok(Some(Self { rows: vec![row] })),
            InsertRows::Batch(rows) if rows.is_empty() => return Ok(None),
            InsertRows::Batch(mut rows) => {
                rows.iter_mut().for_each(InsertRow::sort_keys);
                rows
            }
        };

        let first = &rows[0];
        if first.is_empty() {
            return Err(OrmError::execution(
                "malformed insert batch: first row has no columns",
            ));
        }
        if let Some(pos) = rows.iter().position(|row| !row.same_columns(first)) {
            return Err(OrmError::execution(format!(
                "malformed insert batch: row {pos} has columns ({}) but row 0 has ({})",
                rows[pos].columns().collect::<Vec<_>>().join(", "),
                first.columns().collect::<Vec<_>>().join(", "),
            )));
        }
        Ok(Some(Self { rows }))
    }

    pub fn rows(&self) -> &[InsertRow] {
        &self.rows
    }

    /// Column names, in binding order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.rows[0].columns()
    }

    /// Values per row; equal to the first row's column count.
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Every value of every row, one level deep.
    pub fn flatten(&self) -> Vec<Value> {
        self.rows
            .iter()
            .flat_map(|row| row.values().cloned())
            .collect()
    }

    /// Flattened values re-chunked by [`width`](Self::width), each chunk
    /// cleaned of raw expressions.
    pub fn chunked_bindings(&self) -> Vec<Vec<Value>> {
        self.flatten()
            .chunks(self.width())
            .map(|chunk| clean_bindings(chunk))
            .collect()
    }

    /// Bindings of each row, cleaned of raw expressions.
    pub fn row_bindings(&self) -> Vec<Vec<Value>> {
        self.rows
            .iter()
            .map(|row| clean_bindings(row.values()))
            .collect()
    }
}
