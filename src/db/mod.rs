mod connection;
mod copy;
mod cursor;
mod error;
mod executor;
mod statement;
mod value;

pub use connection::{connect, Connection};
pub use copy::{bulk_load, export_table, validate_delimiter, BulkLoader};
pub use cursor::Cursor;
pub use error::{ConnectError, CopyError, ExecError, Result, StatementError};
pub use executor::{execute_insert, execute_statement};
pub use statement::{
    build_insert, render_table, validate_identifier, validate_table, InsertStatement, PlaceholderStyle,
};
pub use value::{Row, Value};
