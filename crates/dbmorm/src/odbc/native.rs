//! `odbc-api` backed native handle.

use super::handle::{NativeHandle, StatementResult};
use crate::config::DriverOptions;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use odbc_api::buffers::TextRowSet;
use odbc_api::parameter::InputParameter;
use odbc_api::{Bit, ConnectionOptions, Cursor, DataType, Environment, IntoParameter, Nullable};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// Rows fetched per driver round trip.
const FETCH_BATCH_SIZE: usize = 256;

/// Upper bound in bytes for fetched text columns, unless `max_text_len` is set.
///
/// A longer value fails the fetch instead of coming back cut short.
const DEFAULT_MAX_TEXT_LEN: usize = 4096;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

fn environment() -> OrmResult<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(OrmError::from_connect_error)?;
    Ok(ENVIRONMENT.get_or_init(|| env))
}

/// A native ODBC connection handle.
pub struct OdbcHandle {
    connection: Mutex<odbc_api::Connection<'static>>,
    autocommit: AtomicBool,
}

impl OdbcHandle {
    /// Connect to a data source name with credentials.
    pub fn connect(dsn: &str, username: &str, password: &str) -> OrmResult<Self> {
        let env = environment()?;
        let connection = env
            .connect(dsn, username, password, ConnectionOptions::default())
            .map_err(OrmError::from_connect_error)?;
        Ok(Self {
            connection: Mutex::new(connection),
            autocommit: AtomicBool::new(true),
        })
    }

    fn lock(&self) -> OrmResult<MutexGuard<'_, odbc_api::Connection<'static>>> {
        self.connection
            .lock()
            .map_err(|_| OrmError::Other("ODBC connection mutex poisoned".to_string()))
    }
}

impl NativeHandle for OdbcHandle {
    fn prepare(&self, sql: &str) -> OrmResult<()> {
        let conn = self.lock()?;
        conn.prepare(sql)
            .map(drop)
            .map_err(OrmError::from_prepare_error)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
        options: &DriverOptions,
    ) -> OrmResult<StatementResult> {
        let conn = self.lock()?;
        let bound = params
            .iter()
            .map(to_parameter)
            .collect::<OrmResult<Vec<_>>>()?;

        let mut statement = conn.preallocate().map_err(OrmError::from_driver_error)?;

        let max_text_len = options.max_text_len().unwrap_or(DEFAULT_MAX_TEXT_LEN);
        let rows = match statement
            .execute(sql, bound.as_slice())
            .map_err(OrmError::from_driver_error)?
        {
            Some(cursor) => Some(read_rows(cursor, max_text_len)?),
            None => None,
        };

        match rows {
            Some(rows) => Ok(StatementResult::from_rows(rows)),
            None => {
                let affected = statement
                    .row_count()
                    .map_err(OrmError::from_driver_error)?
                    .unwrap_or(0);
                Ok(StatementResult::from_affected(affected as u64))
            }
        }
    }

    fn commit(&self) -> OrmResult<()> {
        self.lock()?.commit().map_err(OrmError::from_driver_error)
    }

    fn rollback(&self) -> OrmResult<()> {
        self.lock()?.rollback().map_err(OrmError::from_driver_error)
    }

    fn set_autocommit(&self, enabled: bool) -> OrmResult<()> {
        self.lock()?
            .set_autocommit(enabled)
            .map_err(OrmError::from_driver_error)?;
        self.autocommit.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn autocommit(&self) -> bool {
        self.autocommit.load(Ordering::SeqCst)
    }
}

fn to_parameter(value: &Value) -> OrmResult<Box<dyn InputParameter>> {
    Ok(match value {
        Value::Null => Box::new(Nullable::<i64>::null()),
        Value::Bool(b) => Box::new(Bit::from_bool(*b)),
        Value::Int(i) => Box::new(*i),
        Value::Float(f) => Box::new(*f),
        Value::Text(s) => Box::new(s.clone().into_parameter()),
        Value::Bytes(b) => Box::new(b.clone().into_parameter()),
        Value::Raw(sql) => {
            return Err(OrmError::execution(format!(
                "raw expression `{sql}` cannot be bound as a parameter"
            )));
        }
    })
}

fn read_rows(mut cursor: impl Cursor, max_text_len: usize) -> OrmResult<Vec<Row>> {
    let names = cursor
        .column_names()
        .map_err(OrmError::from_driver_error)?
        .collect::<Result<Vec<String>, _>>()
        .map_err(OrmError::from_driver_error)?;

    let mut kinds = Vec::with_capacity(names.len());
    for idx in 1..=names.len() {
        kinds.push(
            cursor
                .col_data_type(idx as u16)
                .map_err(OrmError::from_driver_error)?,
        );
    }
    let columns: Arc<[String]> = names.into();

    let buffer = TextRowSet::for_cursor(FETCH_BATCH_SIZE, &mut cursor, Some(max_text_len))
        .map_err(OrmError::from_driver_error)?;
    let mut block_cursor = cursor
        .bind_buffer(buffer)
        .map_err(OrmError::from_driver_error)?;

    let mut rows = Vec::new();
    while let Some(batch) = block_cursor
        .fetch_with_truncation_check(true)
        .map_err(|e| fetch_error(e, max_text_len))?
    {
        for r in 0..batch.num_rows() {
            let values = kinds
                .iter()
                .enumerate()
                .map(|(c, kind)| decode(batch.at(c, r), kind))
                .collect();
            rows.push(Row::new(Arc::clone(&columns), values));
        }
    }
    Ok(rows)
}

fn fetch_error(err: odbc_api::Error, max_text_len: usize) -> OrmError {
    match err {
        odbc_api::Error::TooLargeValueForBuffer { indicator, .. } => {
            let size = indicator.map_or_else(|| "unknown".to_string(), |n| n.to_string());
            OrmError::execution(format!(
                "fetched value of {size} bytes exceeds max_text_len ({max_text_len}); \
                 raise the `max_text_len` driver option"
            ))
        }
        other => OrmError::from_driver_error(other),
    }
}

/// Turn fetched text back into a typed value using the column's SQL type.
fn decode(raw: Option<&[u8]>, kind: &DataType) -> Value {
    let Some(bytes) = raw else {
        return Value::Null;
    };
    let text = String::from_utf8_lossy(bytes).into_owned();
    match kind {
        DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or(Value::Text(text)),
        DataType::Real | DataType::Double | DataType::Float { .. } => text
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or(Value::Text(text)),
        DataType::Bit => Value::Bool(text.trim() == "1"),
        _ => Value::Text(text),
    }
}
