use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;
use crate::db::Value;

#[derive(Parser, Debug)]
#[command(name = "pgaccess")]
#[command(author, version, about = "Parameterized inserts, cursors and bulk COPY against PostgreSQL")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// TOML file with connection settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every statement and its parameters before execution
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Database server host or socket directory
    #[arg(long, env = "PGHOST", global = true)]
    pub host: Option<String>,

    /// Database server port
    #[arg(long, env = "PGPORT", global = true)]
    pub port: Option<u16>,

    /// Database name
    #[arg(long = "dbname", env = "PGDATABASE", global = true)]
    pub dbname: Option<String>,

    /// Database user
    #[arg(short = 'U', long, env = "PGUSER", global = true)]
    pub user: Option<String>,

    /// Database password
    #[arg(long, env = "PGPASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the sample sequence against a scratch `thing` table
    Samples {
        /// File used for the COPY round trip
        #[arg(long, default_value = "db.sql.copy")]
        copy_file: PathBuf,
    },

    /// Bulk-load a delimited file into a table
    Load {
        file: PathBuf,
        table: String,

        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Truncate the table first
        #[arg(long)]
        clear: bool,
    },

    /// Write a table out as delimited text
    Export {
        table: String,

        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Output file (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Insert one row, given as NAME=VALUE pairs
    Insert {
        table: String,

        #[arg(long = "column", value_name = "NAME=VALUE", value_parser = parse_assignment, required = true)]
        columns: Vec<(String, Value)>,
    },
}

fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing column name in {:?}", s));
    }
    Ok((name.to_string(), Value::parse_literal(value)))
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.connection.host.clone(),
            port: self.connection.port,
            dbname: self.connection.dbname.clone(),
            user: self.connection.user.clone(),
            password: self.connection.password.clone(),
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_load() {
        let cli = Cli::try_parse_from([
            "pgaccess", "load", "test_2_10.txt", "data", "--delimiter", "|", "--clear",
        ])
        .unwrap();

        match cli.command {
            Command::Load { file, table, delimiter, clear } => {
                assert_eq!(file, PathBuf::from("test_2_10.txt"));
                assert_eq!(table, "data");
                assert_eq!(delimiter, '|');
                assert!(clear);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_insert_columns() {
        let cli = Cli::try_parse_from([
            "pgaccess", "insert", "thing", "--column", "code=123", "--column", "name=alpha",
        ])
        .unwrap();

        match cli.command {
            Command::Insert { table, columns } => {
                assert_eq!(table, "thing");
                assert_eq!(
                    columns,
                    vec![
                        ("code".to_string(), Value::Literal("123".to_string())),
                        ("name".to_string(), Value::Literal("alpha".to_string())),
                    ]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_insert_values_keep_typed_text() {
        let cli = Cli::try_parse_from(["pgaccess", "insert", "t", "--column", "zip=01234"]).unwrap();

        match cli.command {
            Command::Insert { columns, .. } => {
                assert_eq!(columns, vec![("zip".to_string(), Value::Literal("01234".to_string()))]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_assignment() {
        assert!(parse_assignment("code").is_err());
        assert!(parse_assignment("=1").is_err());
        assert_eq!(
            parse_assignment("name=a=b").unwrap(),
            ("name".to_string(), Value::Literal("a=b".to_string()))
        );
    }

    #[test]
    fn test_connection_flags_override() {
        let cli = Cli::try_parse_from([
            "pgaccess", "--host", "db.internal", "--port", "6543", "-U", "mike", "--verbose",
            "samples",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.host.as_deref(), Some("db.internal"));
        assert_eq!(overrides.port, Some(6543));
        assert_eq!(overrides.user.as_deref(), Some("mike"));
        assert!(overrides.verbose);
    }
}
