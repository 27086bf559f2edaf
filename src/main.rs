use std::fs::File;
use std::io::{stdout, BufWriter, Write};

use tracing::{error, info};

use pgaccess::cli::{Cli, Command};
use pgaccess::config::DbConfig;
use pgaccess::db::{self, BulkLoader, Connection};
use pgaccess::logging;
use pgaccess::samples::run_samples;

fn main() {
    let cli = Cli::parse_args();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init(cli.verbose);
            error!("{}", e);
            std::process::exit(1);
        }
    };
    logging::init(config.verbose);

    // Any failure ends the run: the connection is dropped (closed) on the way
    // out and the process exits non-zero.
    if let Err(e) = run(&config, &cli.command) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<DbConfig, Box<dyn std::error::Error>> {
    let base = match &cli.config {
        Some(path) => DbConfig::load_from(path)?,
        None => DbConfig::default(),
    };
    let config = base.apply(cli.overrides());
    config.validate()?;
    Ok(config)
}

fn run(config: &DbConfig, command: &Command) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = db::connect(config)?;

    run_command(&mut conn, command)?;

    conn.close()?;
    Ok(())
}

fn run_command(conn: &mut Connection, command: &Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Samples { copy_file } => {
            let report = run_samples(conn, copy_file, stdout().lock())?;
            info!(
                "Samples done: {} inserted, {} reloaded from {}",
                report.inserted,
                report.reloaded,
                copy_file.display()
            );
        }
        Command::Load { file, table, delimiter, clear } => {
            BulkLoader::new()
                .with_delimiter(*delimiter)
                .with_clear(*clear)
                .load_file(conn, file, table)?;
        }
        Command::Export { table, delimiter, output } => {
            let bytes = match output {
                Some(path) => {
                    let mut writer = BufWriter::new(File::create(path)?);
                    let bytes = db::export_table(conn, &mut writer, table, *delimiter)?;
                    writer.flush()?;
                    bytes
                }
                None => db::export_table(conn, stdout().lock(), table, *delimiter)?,
            };
            info!("Exported {} bytes from {}", bytes, table);
        }
        Command::Insert { table, columns } => {
            let (names, values): (Vec<&str>, Vec<db::Value>) = columns
                .iter()
                .map(|(name, value)| (name.as_str(), value.clone()))
                .unzip();
            db::execute_insert(conn, table, &names, values)?;
            info!("Inserted 1 row into {}", table);
        }
    }

    Ok(())
}
