//! Bulk transfer between delimited text streams and tables using COPY.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use super::connection::Connection;
use super::error::CopyError;
use super::statement::render_table;

pub type Result<T> = std::result::Result<T, CopyError>;

/// Streams delimited records into a table with `COPY ... FROM STDIN`.
///
/// Records are in the server's text COPY format: one per line, no header,
/// fields in table column order, `\N` for NULL.
pub struct BulkLoader {
    delimiter: char,
    clear: bool,
}

impl Default for BulkLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkLoader {
    pub fn new() -> Self {
        Self {
            delimiter: ',',
            clear: false,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Truncate the table before loading.
    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn load_file(&self, conn: &mut Connection, path: &Path, table: &str) -> Result<u64> {
        let file = File::open(path)?;
        self.load(conn, BufReader::new(file), table)
    }

    /// Truncate (optional) and copy run in one transaction, so a failed load
    /// leaves the table as it was. Returns the number of rows copied.
    pub fn load<R: Read>(&self, conn: &mut Connection, mut source: R, table: &str) -> Result<u64> {
        let table = render_table(table)?;
        let copy_sql = copy_statement(&table, "FROM STDIN", self.delimiter)?;
        let truncate_sql = format!("TRUNCATE {}", table);

        if self.clear {
            conn.record(&truncate_sql, &[]);
        }
        conn.record(&copy_sql, &[]);

        let mut transaction = conn.client_mut().transaction()?;
        if self.clear {
            debug!(table = %table, "truncating before load");
            transaction.batch_execute(&truncate_sql)?;
        }

        let mut writer = transaction.copy_in(copy_sql.as_str())?;
        io::copy(&mut source, &mut writer)?;
        let rows = writer.finish()?;
        transaction.commit()?;

        info!("Loaded {} rows into {}", rows, table);
        Ok(rows)
    }
}

/// Loads `source` into `table`, optionally clearing it first.
pub fn bulk_load<R: Read>(
    conn: &mut Connection,
    source: R,
    table: &str,
    delimiter: char,
    clear_before_load: bool,
) -> Result<u64> {
    BulkLoader::new()
        .with_delimiter(delimiter)
        .with_clear(clear_before_load)
        .load(conn, source, table)
}

/// Writes every row of `table` to `sink` as delimited text. Returns the
/// number of bytes written.
pub fn export_table<W: Write>(
    conn: &mut Connection,
    mut sink: W,
    table: &str,
    delimiter: char,
) -> Result<u64> {
    let table = render_table(table)?;
    let copy_sql = copy_statement(&table, "TO STDOUT", delimiter)?;
    conn.record(&copy_sql, &[]);

    let mut reader = conn.client_mut().copy_out(copy_sql.as_str())?;
    let bytes = io::copy(&mut reader, &mut sink)?;
    sink.flush()?;

    debug!(bytes, table = %table, "exported");
    Ok(bytes)
}

fn copy_statement(table: &str, direction: &str, delimiter: char) -> Result<String> {
    let delimiter = validate_delimiter(delimiter)?;
    let quoted = if delimiter == '\'' {
        "''".to_string()
    } else {
        delimiter.to_string()
    };

    Ok(format!(
        "COPY {} {} WITH (FORMAT text, DELIMITER '{}')",
        table, direction, quoted
    ))
}

/// Text-format COPY needs a single one-byte delimiter that cannot be confused
/// with the record separator, backslash escapes, the `\N` null marker or the
/// `\.` end-of-data line.
pub fn validate_delimiter(delimiter: char) -> Result<char> {
    if !delimiter.is_ascii()
        || delimiter.is_ascii_alphanumeric()
        || matches!(delimiter, '\n' | '\r' | '\\' | '\0' | '.')
    {
        return Err(CopyError::InvalidDelimiter(delimiter));
    }
    Ok(delimiter)
}
