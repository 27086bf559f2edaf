use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StatementError {
    #[error("Table name is empty")]
    EmptyTable,

    #[error("No columns given for table {0}")]
    NoColumns(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Got {values} values for {columns} columns")]
    ArityMismatch { columns: usize, values: usize },
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Failed to connect to {target}: {source}")]
    Driver {
        target: String,
        #[source]
        source: postgres::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Invalid statement: {0}")]
    Statement(#[from] StatementError),

    #[error("Statement failed ({sql}): {source}")]
    Driver {
        sql: String,
        #[source]
        source: postgres::Error,
    },
}

#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Invalid statement: {0}")]
    Statement(#[from] StatementError),

    #[error("Invalid delimiter {0:?}: must be a single-byte character other than newline, carriage return or backslash")]
    InvalidDelimiter(char),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Driver(#[from] postgres::Error),
}

pub type Result<T> = std::result::Result<T, ExecError>;
