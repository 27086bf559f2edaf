//! A guided tour of the access layer against a scratch `thing` table.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::db::{
    bulk_load, execute_insert, export_table, Connection, CopyError, ExecError, Row, Value,
};

pub const SAMPLE_TABLE: &str = "thing";

#[derive(Error, Debug)]
pub enum SampleError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Copy(#[from] CopyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Row counts observed at each step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleReport {
    pub literals: Option<Row>,
    pub inserted: usize,
    pub iterated: usize,
    pub fetched_one_by_one: usize,
    pub fetch_many_batches: Vec<usize>,
    pub fetched_all: usize,
    pub matched: Vec<Row>,
    pub exported_bytes: u64,
    pub reloaded: u64,
    pub final_rows: Vec<Row>,
}

fn sample_rows() -> Vec<[Value; 2]> {
    vec![
        [Value::Integer(123), "alpha".into()],
        [Value::Integer(456), "beta".into()],
        [Value::Integer(789), "gamma".into()],
    ]
}

fn print_rows(rows: &[Row]) {
    for row in rows {
        println!("{}", row);
    }
}

/// Runs the sample sequence. The `|`-delimited export goes to `out`, the
/// `,`-delimited one to `copy_file`, which is then loaded back.
pub fn run_samples<W: Write>(
    conn: &mut Connection,
    copy_file: &Path,
    mut out: W,
) -> Result<SampleReport, SampleError> {
    let mut report = SampleReport::default();
    let select_all = format!("SELECT * FROM {}", SAMPLE_TABLE);

    let literals = conn.query(
        "SELECT $1::text, $2::bool, $3::bool",
        &[Value::Null, Value::Boolean(true), Value::Boolean(false)],
    )?;
    report.literals = literals.into_iter().next();

    info!("Preparing table {}", SAMPLE_TABLE);
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (code integer, name varchar(80))",
        SAMPLE_TABLE
    ))?;
    conn.execute_batch(&format!("TRUNCATE {}", SAMPLE_TABLE))?;

    for values in sample_rows() {
        execute_insert(conn, SAMPLE_TABLE, &["code", "name"], values)?;
        report.inserted += 1;
    }

    info!("Iterating a cursor");
    let cursor = conn.cursor(&select_all, &[])?;
    for row in cursor {
        println!("{}", row?);
        report.iterated += 1;
    }

    info!("Fetching one row at a time");
    let mut cursor = conn.cursor(&select_all, &[])?;
    while let Some(row) = cursor.fetch_one()? {
        println!("{}", row);
        report.fetched_one_by_one += 1;
    }
    cursor.close()?;

    info!("Fetching two rows at a time");
    let mut cursor = conn.cursor(&select_all, &[])?;
    for _ in 0..3 {
        let batch = cursor.fetch_many(2)?;
        print_rows(&batch);
        report.fetch_many_batches.push(batch.len());
    }
    cursor.close()?;

    info!("Fetching everything");
    let mut cursor = conn.cursor(&select_all, &[])?;
    let rows = cursor.fetch_all()?;
    print_rows(&rows);
    report.fetched_all = rows.len();
    cursor.close()?;

    let filtered = format!("SELECT * FROM {} WHERE code = $1", SAMPLE_TABLE);
    report.matched = conn.query(&filtered, &[Value::Integer(123)])?;
    print_rows(&report.matched);
    if let Some(sql) = conn.last_statement() {
        info!("Last statement: {}", sql);
    }

    info!("Copying {} out and back in", SAMPLE_TABLE);
    export_table(conn, &mut out, SAMPLE_TABLE, '|')?;
    {
        let mut file = BufWriter::new(File::create(copy_file)?);
        report.exported_bytes = export_table(conn, &mut file, SAMPLE_TABLE, ',')?;
        file.flush()?;
    }

    report.reloaded = bulk_load(conn, File::open(copy_file)?, SAMPLE_TABLE, ',', true)?;

    report.final_rows = conn.query(&select_all, &[])?;
    print_rows(&report.final_rows);

    Ok(report)
}
