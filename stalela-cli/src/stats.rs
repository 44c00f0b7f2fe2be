//! `stats` command: directory totals.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use stalela_store::Companies;

use crate::{ARG_DATABASE, CliError, ENV_STATS_DATABASE, open_existing, write_json};

/// CLI arguments for the `stats` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Summarise the business directory")]
#[ortho_config(prefix = "STALELA")]
pub(crate) struct StatsArgs {
    /// Path to the SQLite database file.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

pub(crate) fn run_stats_with(args: StatsArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let database = merged.database.ok_or(CliError::MissingArgument {
        field: ARG_DATABASE,
        env: ENV_STATS_DATABASE,
    })?;
    let db = open_existing(&database)?;
    let stats = Companies::new(&db).stats()?;
    write_json(writer, &stats)
}
