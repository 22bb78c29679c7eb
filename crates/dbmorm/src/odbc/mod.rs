//! Connection/transaction bridge over one native ODBC handle.
//!
//! The bridge knows nothing about SQL dialects: it prepares and executes
//! statement text and toggles the handle's autocommit flag. Driver calls block,
//! so each one runs on tokio's blocking pool while the calling task awaits it.
//!
//! ```ignore
//! use dbmorm::odbc::Connection;
//! use dbmorm::DriverOptions;
//!
//! let conn = Connection::connect("DBSAMPLE", "SYSADM", "", DriverOptions::new()).await?;
//! conn.begin_transaction().await?;
//! conn.exec("UPDATE ACCOUNTS SET BALANCE = 0").await?;
//! conn.roll_back().await?; // autocommit is back on
//! ```

mod handle;
mod statement;

#[cfg(feature = "odbc")]
mod native;


pub use handle::{NativeHandle, StatementResult};
pub use statement::Statement;

#[cfg(feature = "odbc")]
pub use native::OdbcHandle;

use crate::client::GenericClient;
use crate::config::{DriverOptions, IdCap};
use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Run a blocking handle operation on the blocking pool.
pub(crate) async fn run_blocking<H, T, F>(handle: &Arc<H>, op: F) -> OrmResult<T>
where
    H: NativeHandle,
    T: Send + 'static,
    F: FnOnce(&H) -> OrmResult<T> + Send + 'static,
{
    let handle = Arc::clone(handle);
    tokio::task::spawn_blocking(move || op(&handle)).await?
}

/// One live database handle plus its driver options.
///
/// `DB_IDCap` is resolved from the options once, at construction.
pub struct Connection<H: NativeHandle> {
    handle: Arc<H>,
    options: DriverOptions,
    id_cap: IdCap,
}

impl<H: NativeHandle> Connection<H> {
    /// Wrap an already-open native handle.
    pub fn from_handle(handle: H, options: DriverOptions) -> Self {
        let id_cap = options.id_cap();
        Self {
            handle: Arc::new(handle),
            options,
            id_cap,
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Driver options exactly as supplied at construction.
    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    pub fn id_cap(&self) -> IdCap {
        self.id_cap
    }

    /// Whether the handle is currently in autocommit mode.
    pub fn autocommit(&self) -> bool {
        self.handle.autocommit()
    }

    /// Prepare and immediately execute `sql` without parameters.
    pub async fn exec(&self, sql: &str) -> OrmResult<StatementResult> {
        self.prepare(sql, None).await?.execute(&[]).await
    }

    /// Bind statement text to this handle without executing it.
    ///
    /// The text is checked by the driver here so a rejected statement fails
    /// with [`OrmError::Prepare`](crate::OrmError::Prepare) before anything
    /// runs. The check is a separate round trip: [`Statement::execute`] sends
    /// the text again.
    ///
    /// `driver_options`, when given, override the connection options for this
    /// statement only.
    pub async fn prepare(
        &self,
        sql: &str,
        driver_options: Option<&DriverOptions>,
    ) -> OrmResult<Statement<H>> {
        let text = sql.to_string();
        run_blocking(&self.handle, move |h| h.prepare(&text)).await?;
        let options = match driver_options {
            Some(extra) => self.options.overlay(extra),
            None => self.options.clone(),
        };
        Ok(Statement::new(Arc::clone(&self.handle), sql.to_string(), options))
    }

    pub async fn commit(&self) -> OrmResult<()> {
        run_blocking(&self.handle, |h| h.commit()).await
    }

    /// Turn autocommit off; statements are held until commit or rollback.
    pub async fn begin_transaction(&self) -> OrmResult<()> {
        run_blocking(&self.handle, |h| h.set_autocommit(false)).await
    }

    /// Roll back, then turn autocommit back on whatever the rollback reported.
    ///
    /// A rollback failure takes precedence over a failure to restore autocommit.
    pub async fn roll_back(&self) -> OrmResult<()> {
        run_blocking(&self.handle, |h| {
            let rolled_back = h.rollback();
            let restored = h.set_autocommit(true);
            if let Err(ref _restore_err) = restored {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    target: "dbmorm",
                    error = %_restore_err,
                    "failed to restore autocommit after rollback"
                );
            }
            match rolled_back {
                Ok(()) => restored,
                Err(rollback_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(target: "dbmorm", error = %rollback_err, "rollback failed");
                    Err(rollback_err)
                }
            }
        })
        .await
    }

    /// Turn autocommit back on after a committed transaction.
    pub async fn end_transaction(&self) -> OrmResult<()> {
        run_blocking(&self.handle, |h| h.set_autocommit(true)).await
    }
}

#[cfg(feature = "odbc")]
impl Connection<OdbcHandle> {
    /// Open a native ODBC connection.
    pub async fn connect(
        dsn: &str,
        username: &str,
        password: &str,
        options: DriverOptions,
    ) -> OrmResult<Self> {
        let (dsn, username, password) = (dsn.to_string(), username.to_string(), password.to_string());
        let handle =
            tokio::task::spawn_blocking(move || OdbcHandle::connect(&dsn, &username, &password))
                .await??;
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "dbmorm", id_cap = ?options.id_cap(), "ODBC connection established");
        Ok(Self::from_handle(handle, options))
    }

    /// Open a native ODBC connection from [`ConnectOptions`](crate::ConnectOptions).
    pub async fn connect_with(opts: &crate::config::ConnectOptions) -> OrmResult<Self> {
        Self::connect(&opts.dsn, &opts.username, &opts.password, opts.options.clone()).await
    }
}

impl<H: NativeHandle> fmt::Debug for Connection<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .field("id_cap", &self.id_cap)
            .field("autocommit", &self.handle.autocommit())
            .finish_non_exhaustive()
    }
}

impl<H: NativeHandle> GenericClient for Connection<H> {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let statement = self.prepare(sql, None).await?;
        Ok(statement.execute(params).await?.into_rows())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let statement = self.prepare(sql, None).await?;
        Ok(statement.execute(params).await?.affected())
    }

    fn id_cap(&self) -> IdCap {
        self.id_cap
    }
}
