use postgres::{Client, Portal, Transaction};

use super::connection::as_params;
use super::error::{ExecError, Result};
use super::value::{Row, Value};

/// A server-side portal over a query, fetched incrementally.
///
/// The portal lives inside its own transaction, which is rolled back when
/// the cursor is closed or dropped.
pub struct Cursor<'a> {
    transaction: Transaction<'a>,
    portal: Portal,
    sql: String,
    exhausted: bool,
}

impl<'a> Cursor<'a> {
    pub(crate) fn open(client: &'a mut Client, sql: &str, params: &[Value]) -> Result<Self> {
        let driver_err = |source| ExecError::Driver {
            sql: sql.to_string(),
            source,
        };

        let mut transaction = client.transaction().map_err(driver_err)?;
        let portal = transaction.bind(sql, &as_params(params)).map_err(driver_err)?;

        Ok(Self {
            transaction,
            portal,
            sql: sql.to_string(),
            exhausted: false,
        })
    }

    fn fetch(&mut self, max_rows: i32) -> Result<Vec<Row>> {
        if self.exhausted {
            return Ok(Vec::new());
        }

        let rows = self
            .transaction
            .query_portal(&self.portal, max_rows)
            .map_err(|source| ExecError::Driver {
                sql: self.sql.clone(),
                source,
            })?;

        // max_rows of 0 asks for everything that is left.
        if max_rows == 0 || rows.len() < max_rows as usize {
            self.exhausted = true;
        }

        rows.iter()
            .map(|row| {
                Row::try_from(row).map_err(|source| ExecError::Driver {
                    sql: self.sql.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Next row, or `None` once the result set is exhausted.
    pub fn fetch_one(&mut self) -> Result<Option<Row>> {
        Ok(self.fetch(1)?.into_iter().next())
    }

    /// Up to `n` rows; fewer near the end, none when exhausted.
    pub fn fetch_many(&mut self, n: usize) -> Result<Vec<Row>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.fetch(i32::try_from(n).unwrap_or(i32::MAX))
    }

    /// Every remaining row.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.fetch(0)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn close(self) -> Result<()> {
        let sql = self.sql;
        self.transaction
            .rollback()
            .map_err(|source| ExecError::Driver { sql, source })
    }
}

impl Iterator for Cursor<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.fetch_one().transpose()
    }
}
