//! `init` command: create the database file and bootstrap its schema.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use stalela_store::Database;

use crate::{ARG_DATABASE, CliError, ENV_INIT_DATABASE, write_json};

/// CLI arguments for the `init` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Create the SQLite database (and any missing parent \
                 directories) and every table it needs. Running it against \
                 an existing database leaves stored rows untouched.",
    about = "Create the database and its schema"
)]
#[ortho_config(prefix = "STALELA")]
pub(crate) struct InitArgs {
    /// Path to the SQLite database file.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InitConfig {
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<InitArgs> for InitConfig {
    type Error = CliError;

    fn try_from(args: InitArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_INIT_DATABASE,
        })?;
        Ok(Self { database })
    }
}

/// Printed once the schema is in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct InitReport {
    pub(crate) database: Utf8PathBuf,
    /// False when the file already existed.
    pub(crate) created: bool,
}

pub(crate) fn run_init_with(args: InitArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = InitConfig::try_from(merged)?;
    let report = initialise(&config)?;
    write_json(writer, &report)
}

pub(crate) fn initialise(config: &InitConfig) -> Result<InitReport, CliError> {
    let existed = stalela_fs::database_exists(&config.database).map_err(|source| {
        CliError::InspectDatabase {
            path: config.database.clone(),
            source,
        }
    })?;
    let db = Database::open(&config.database)?;
    db.bootstrap()?;
    Ok(InitReport {
        database: config.database.clone(),
        created: !existed,
    })
}
