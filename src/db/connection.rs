use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tracing::{debug, info};

use crate::config::DbConfig;

use super::cursor::Cursor;
use super::error::{ConnectError, ExecError, Result};
use super::value::{Row, Value};

/// An open database session. Used through `&mut`, so one caller at a time.
/// Dropping it closes the underlying socket.
pub struct Connection {
    client: Client,
    verbose: bool,
    last_statement: Option<String>,
}

/// Opens a connection. Failures are returned to the caller; there is no retry.
pub fn connect(config: &DbConfig) -> std::result::Result<Connection, ConnectError> {
    debug!(target_db = %config, "connecting");

    match config.to_pg_config().connect(NoTls) {
        Ok(client) => {
            info!("Connected to {}", config);
            Ok(Connection {
                client,
                verbose: config.verbose,
                last_statement: None,
            })
        }
        Err(source) => Err(ConnectError::Driver {
            target: config.to_string(),
            source,
        }),
    }
}

/// Logs a statement and its parameters ahead of execution in verbose mode.
pub(crate) fn trace_statement(verbose: bool, sql: &str, params: &[Value]) {
    if verbose {
        debug!(sql, ?params, "executing");
    }
}

pub(crate) fn as_params(values: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Connection {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Text of the last statement sent through this connection.
    pub fn last_statement(&self) -> Option<&str> {
        self.last_statement.as_deref()
    }

    pub(crate) fn record(&mut self, sql: &str, params: &[Value]) {
        trace_statement(self.verbose, sql, params);
        self.last_statement = Some(sql.to_string());
    }

    pub(crate) fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Runs one or more statements without parameters or results
    /// (DDL, TRUNCATE and the like). Autocommitted.
    pub fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.record(sql, &[]);
        self.client
            .batch_execute(sql)
            .map_err(|source| ExecError::Driver {
                sql: sql.to_string(),
                source,
            })
    }

    /// Runs a query and collects every row.
    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.record(sql, params);
        let driver_err = |source| ExecError::Driver {
            sql: sql.to_string(),
            source,
        };

        let rows = self.client.query(sql, &as_params(params)).map_err(driver_err)?;
        rows.iter()
            .map(|row| Row::try_from(row).map_err(driver_err))
            .collect()
    }

    /// Opens a server-side cursor for incremental fetching.
    pub fn cursor(&mut self, sql: &str, params: &[Value]) -> Result<Cursor<'_>> {
        self.record(sql, params);
        Cursor::open(&mut self.client, sql, params)
    }

    /// Closes the session, reporting any error from the shutdown handshake.
    pub fn close(self) -> Result<()> {
        self.client.close().map_err(|source| ExecError::Driver {
            sql: "<close>".to_string(),
            source,
        })
    }
}
