use tracing::{debug, warn};

use super::connection::{as_params, Connection};
use super::error::{ExecError, Result};
use super::statement::{build_insert, InsertStatement, PlaceholderStyle};
use super::value::Value;

/// Inserts one row and commits it. On failure the transaction is rolled back
/// and the error returned; the connection stays usable if the server is.
pub fn execute_insert<S, V>(conn: &mut Connection, table: &str, columns: &[S], values: V) -> Result<()>
where
    S: AsRef<str>,
    V: IntoIterator,
    V::Item: Into<Value>,
{
    let statement = build_insert(table, columns, values)?;
    execute_statement(conn, &statement)
}

/// Executes an already built INSERT in its own transaction.
pub fn execute_statement(conn: &mut Connection, statement: &InsertStatement) -> Result<()> {
    let sql = statement.sql(PlaceholderStyle::Numbered);
    if conn.verbose() {
        debug!("{}", statement.sql(PlaceholderStyle::Format));
    }
    conn.record(&sql, statement.params());

    let driver_err = |source| ExecError::Driver {
        sql: sql.clone(),
        source,
    };

    let mut transaction = conn.client_mut().transaction().map_err(driver_err)?;

    match transaction.execute(sql.as_str(), &as_params(statement.params())) {
        Ok(rows) => {
            debug!(rows, table = statement.table(), "insert committed");
            transaction.commit().map_err(driver_err)
        }
        Err(source) => {
            if let Err(e) = transaction.rollback() {
                warn!("Rollback after failed insert also failed: {}", e);
            }
            Err(driver_err(source))
        }
    }
}

