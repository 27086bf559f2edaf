pub mod cli;
pub mod config;
pub mod db;
pub mod logging;
pub mod samples;

pub use config::DbConfig;
pub use db::{build_insert, bulk_load, connect, execute_insert, Connection, Value};
