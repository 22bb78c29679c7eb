//! Column plucking over either row shape.

use crate::row::{RowAccess, RowSet};
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Result of `pluck`: a list of values, or values keyed by a second column.
#[derive(Debug, Clone, PartialEq)]
pub enum Plucked {
    Values(Vec<Value>),
    Keyed(KeyedValues),
}

impl Plucked {
    pub fn len(&self) -> usize {
        match self {
            Plucked::Values(values) => values.len(),
            Plucked::Keyed(keyed) => keyed.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plucked values in order, dropping keys if present.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Plucked::Values(values) => values,
            Plucked::Keyed(keyed) => keyed.entries.into_iter().map(|(_, v)| v).collect(),
        }
    }

    pub fn as_keyed(&self) -> Option<&KeyedValues> {
        match self {
            Plucked::Keyed(keyed) => Some(keyed),
            Plucked::Values(_) => None,
        }
    }
}

impl Serialize for Plucked {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Plucked::Values(values) => values.serialize(serializer),
            Plucked::Keyed(keyed) => keyed.serialize(serializer),
        }
    }
}

/// Insertion-ordered key → value mapping.
///
/// Re-inserting a key replaces its value but keeps its first position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedValues {
    entries: Vec<(Value, Value)>,
    index: HashMap<Value, usize>,
}

impl KeyedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl Serialize for KeyedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

/// Strip a table qualifier or `AS` alias so the name matches result columns.
///
/// `users.email` → `email`, `users.email as contact` → `contact`.
pub fn strip_table_for_pluck(column: &str) -> &str {
    let lowered = column.to_ascii_lowercase();
    let tail = match lowered.rfind(" as ") {
        Some(pos) => &column[pos + 4..],
        None => column.rsplit('.').next().unwrap_or(column),
    };
    tail.trim()
}

/// Pick `column` (optionally keyed by `key`) out of every row.
///
/// The row shape is matched once for the whole set. Missing columns read as
/// NULL. `ignore_case` enables ASCII case-insensitive column lookup.
pub(crate) fn pluck_rows(
    rows: &RowSet,
    column: &str,
    key: Option<&str>,
    ignore_case: bool,
) -> Plucked {
    match rows {
        RowSet::Rows(rows) => pluck_from(rows, column, key, ignore_case),
        RowSet::Records(records) => pluck_from(records, column, key, ignore_case),
    }
}

fn pluck_from<R: RowAccess>(
    rows: &[R],
    column: &str,
    key: Option<&str>,
    ignore_case: bool,
) -> Plucked {
    let read = |row: &R, name: &str| -> Value {
        let found = if ignore_case {
            row.get_ignore_case(name)
        } else {
            row.get(name)
        };
        found.cloned().unwrap_or_default()
    };

    match key {
        None => Plucked::Values(rows.iter().map(|row| read(row, column)).collect()),
        Some(key) => {
            let mut keyed = KeyedValues::new();
            for row in rows {
                keyed.insert(read(row, key), read(row, column));
            }
            Plucked::Keyed(keyed)
        }
    }
}
