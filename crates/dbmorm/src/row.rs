//! Row shapes, typed access and mapping traits.
//!
//! A result set comes back either array-shaped ([`Row`]: positional values
//! sharing one column list) or object-shaped ([`Record`]: name/value pairs).
//! [`RowSet`] carries one or the other for a whole result, and both shapes are
//! read through the same [`RowAccess`] trait.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use serde::Serialize;
use serde::ser::SerializeMap;
use std::sync::Arc;

/// Uniform read access over both row shapes.
pub trait RowAccess {
    /// Number of columns in the row.
    fn width(&self) -> usize;

    /// Column name at a 0-based position.
    fn column_name(&self, idx: usize) -> Option<&str>;

    /// Value at a 0-based position.
    fn value_at(&self, idx: usize) -> Option<&Value>;

    /// Value of the named column (exact match).
    fn get(&self, column: &str) -> Option<&Value> {
        (0..self.width())
            .find(|&i| self.column_name(i) == Some(column))
            .and_then(|i| self.value_at(i))
    }

    /// Value of the named column, falling back to an ASCII case-insensitive match.
    fn get_ignore_case(&self, column: &str) -> Option<&Value> {
        self.get(column).or_else(|| {
            (0..self.width())
                .find(|&i| {
                    self.column_name(i)
                        .is_some_and(|name| name.eq_ignore_ascii_case(column))
                })
                .and_then(|i| self.value_at(i))
        })
    }
}

/// An array-shaped row: positional values with a shared column list.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self::new(columns.into(), values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Convert into an object-shaped record.
    pub fn into_record(self) -> Record {
        Record {
            fields: self.columns.iter().cloned().zip(self.values).collect(),
        }
    }

    /// Typed access by column name.
    pub fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get_ignore_case(column)
            .ok_or_else(|| OrmError::decode(column, "column not present in row"))?;
        T::from_value(value).map_err(|message| OrmError::decode(column, message))
    }

    /// Typed access by 0-based position.
    pub fn try_get_at<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let value = self
            .values
            .get(idx)
            .ok_or_else(|| OrmError::decode(idx.to_string(), "column index out of range"))?;
        T::from_value(value).map_err(|message| OrmError::decode(idx.to_string(), message))
    }
}

impl RowAccess for Row {
    fn width(&self) -> usize {
        self.values.len()
    }

    fn column_name(&self, idx: usize) -> Option<&str> {
        self.columns.get(idx).map(String::as_str)
    }

    fn value_at(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }
}

impl Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// An object-shaped row: ordered `(name, value)` fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing field of the same name in place.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

impl RowAccess for Record {
    fn width(&self) -> usize {
        self.fields.len()
    }

    fn column_name(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(|(n, _)| n.as_str())
    }

    fn value_at(&self, idx: usize) -> Option<&Value> {
        self.fields.get(idx).map(|(_, v)| v)
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A processed result set in one of the two row shapes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RowSet {
    Rows(Vec<Row>),
    Records(Vec<Record>),
}

impl Default for RowSet {
    fn default() -> Self {
        RowSet::Rows(Vec::new())
    }
}

impl RowSet {
    pub fn len(&self) -> usize {
        match self {
            RowSet::Rows(rows) => rows.len(),
            RowSet::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of `column` in the last row, if any.
    pub fn last_value(&self, column: &str, ignore_case: bool) -> Option<&Value> {
        fn pick<'a, R: RowAccess>(row: &'a R, column: &str, ignore_case: bool) -> Option<&'a Value> {
            if ignore_case {
                row.get_ignore_case(column)
            } else {
                row.get(column)
            }
        }
        match self {
            RowSet::Rows(rows) => rows.last().and_then(|r| pick(r, column, ignore_case)),
            RowSet::Records(records) => records.last().and_then(|r| pick(r, column, ignore_case)),
        }
    }

    /// First column of the first row, if any.
    pub fn first_scalar(&self) -> Option<&Value> {
        match self {
            RowSet::Rows(rows) => rows.first().and_then(|r| r.value_at(0)),
            RowSet::Records(records) => records.first().and_then(|r| r.value_at(0)),
        }
    }

    /// Keep only the first row.
    pub fn into_first(self) -> Option<RowSet> {
        match self {
            RowSet::Rows(rows) => rows.into_iter().next().map(|r| RowSet::Rows(vec![r])),
            RowSet::Records(records) => records
                .into_iter()
                .next()
                .map(|r| RowSet::Records(vec![r])),
        }
    }

    /// Array-shaped rows; records are converted back using their field order.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            RowSet::Rows(rows) => rows,
            RowSet::Records(records) => records
                .into_iter()
                .map(|r| Row::from_pairs(r.fields))
                .collect(),
        }
    }

    /// Map every row to `T`.
    pub fn fetch_as<T: FromRow>(self) -> OrmResult<Vec<T>> {
        self.into_rows().iter().map(T::from_row).collect()
    }
}

/// Conversion from a single [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value
            .as_i64()
            .ok_or_else(|| format!("expected integer, got {value:?}"))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|e| e.to_string())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value
            .as_f64()
            .ok_or_else(|| format!("expected number, got {value:?}"))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Err("unexpected NULL".to_string()),
            other => Ok(other.is_truthy()),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Err("unexpected NULL".to_string()),
            Value::Bytes(b) => String::from_utf8(b.clone()).map_err(|e| e.to_string()),
            other => Ok(other.to_string()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Trait for converting a database row into a Rust struct.
///
/// # Example
///
/// ```ignore
/// use dbmorm::{FromRow, OrmResult, Row};
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> OrmResult<Self> {
///         Ok(Self {
///             id: row.try_get("ID")?,
///             name: row.try_get("NAME")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

impl FromRow for i64 {
    fn from_row(row: &Row) -> OrmResult<Self> {
        row.try_get_at(0)
    }
}
