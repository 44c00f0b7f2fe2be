//! Command-line interface for the Stalela business directory.
//!
//! Every subcommand reads its options from CLI flags, `STALELA_`-prefixed
//! environment variables and configuration files (in that order of
//! precedence) and prints its result to stdout as pretty JSON.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use serde::Serialize;
use stalela_store::Database;

mod bbox;
mod error;
mod init;
mod nearby;
mod stats;

pub use error::CliError;

use bbox::{BboxArgs, run_bbox_with};
use init::{InitArgs, run_init_with};
use nearby::{NearbyArgs, run_nearby_with};
use stats::{StatsArgs, run_stats_with};

const ARG_DATABASE: &str = "database";
const ARG_LAT: &str = "lat";
const ARG_LNG: &str = "lng";
const ARG_RADIUS_KM: &str = "radius-km";
const ARG_LIMIT: &str = "limit";
const ARG_MIN_LAT: &str = "min-lat";
const ARG_MAX_LAT: &str = "max-lat";
const ARG_MIN_LNG: &str = "min-lng";
const ARG_MAX_LNG: &str = "max-lng";
const ARG_SOURCE: &str = "source";

const ENV_INIT_DATABASE: &str = "STALELA_CMDS_INIT_DATABASE";
const ENV_NEARBY_DATABASE: &str = "STALELA_CMDS_NEARBY_DATABASE";
const ENV_NEARBY_LAT: &str = "STALELA_CMDS_NEARBY_LAT";
const ENV_NEARBY_LNG: &str = "STALELA_CMDS_NEARBY_LNG";
const ENV_NEARBY_RADIUS_KM: &str = "STALELA_CMDS_NEARBY_RADIUS_KM";
const ENV_BBOX_DATABASE: &str = "STALELA_CMDS_BBOX_DATABASE";
const ENV_BBOX_MIN_LAT: &str = "STALELA_CMDS_BBOX_MIN_LAT";
const ENV_BBOX_MAX_LAT: &str = "STALELA_CMDS_BBOX_MAX_LAT";
const ENV_BBOX_MIN_LNG: &str = "STALELA_CMDS_BBOX_MIN_LNG";
const ENV_BBOX_MAX_LNG: &str = "STALELA_CMDS_BBOX_MAX_LNG";
const ENV_STATS_DATABASE: &str = "STALELA_CMDS_STATS_DATABASE";

/// Run the Stalela CLI with the current process arguments and environment.
///
/// # Errors
/// Returns a [`CliError`] describing the first failure; the binary prints
/// it and exits non-zero.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &mut stdout)
}

fn run_command(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Init(args) => run_init_with(args, writer),
        Command::Nearby(args) => run_nearby_with(args, writer),
        Command::Bbox(args) => run_bbox_with(args, writer),
        Command::Stats(args) => run_stats_with(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "stalela",
    about = "Query and maintain the Stalela business directory",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database file and its schema.
    Init(InitArgs),
    /// List businesses near a point, nearest first.
    Nearby(NearbyArgs),
    /// List map pins inside a latitude/longitude box.
    Bbox(BboxArgs),
    /// Summarise the business directory.
    Stats(StatsArgs),
}

/// Fail unless `path` names an existing database file.
///
/// Read-only commands call this so a typo does not silently create an
/// empty database.
fn require_database(path: &Utf8Path) -> Result<(), CliError> {
    match stalela_fs::database_exists(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::MissingDatabase {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectDatabase {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn open_existing(path: &Utf8Path) -> Result<Database, CliError> {
    require_database(path)?;
    Ok(Database::open(path)?)
}

fn write_json<T>(writer: &mut dyn Write, value: &T) -> Result<(), CliError>
where
    T: Serialize + ?Sized,
{
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
