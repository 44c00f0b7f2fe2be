//! `bbox` command: map pins inside a viewport.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use stalela_store::{BoundingBoxQuery, Companies, CompanyPin, CompanySource};

use crate::{
    ARG_DATABASE, ARG_LIMIT, ARG_MAX_LAT, ARG_MAX_LNG, ARG_MIN_LAT, ARG_MIN_LNG, ARG_SOURCE,
    CliError, ENV_BBOX_DATABASE, ENV_BBOX_MAX_LAT, ENV_BBOX_MAX_LNG, ENV_BBOX_MIN_LAT,
    ENV_BBOX_MIN_LNG, open_existing, write_json,
};

/// CLI arguments for the `bbox` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Print the id, name, coordinates and source of every \
                 business whose coordinates fall inside the given box. \
                 Bounds are inclusive.",
    about = "List map pins inside a box"
)]
#[ortho_config(prefix = "STALELA")]
pub(crate) struct BboxArgs {
    /// Path to the SQLite database file.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Southern edge in degrees.
    #[arg(long = ARG_MIN_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) min_lat: Option<f64>,
    /// Northern edge in degrees.
    #[arg(long = ARG_MAX_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) max_lat: Option<f64>,
    /// Western edge in degrees.
    #[arg(long = ARG_MIN_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) min_lng: Option<f64>,
    /// Eastern edge in degrees.
    #[arg(long = ARG_MAX_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) max_lng: Option<f64>,
    /// Only pins from this directory (yep, bizcommunity, bestdirectory).
    #[arg(long = ARG_SOURCE, value_name = "source")]
    #[serde(default)]
    pub(crate) source: Option<CompanySource>,
    /// Maximum number of pins (defaults to 5000).
    #[arg(long = ARG_LIMIT, value_name = "n")]
    #[serde(default)]
    pub(crate) limit: Option<u64>,
}

/// Resolved `bbox` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BboxConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) query: BoundingBoxQuery,
}

fn required(value: Option<f64>, field: &'static str, env: &'static str) -> Result<f64, CliError> {
    value.ok_or(CliError::MissingArgument { field, env })
}

impl TryFrom<BboxArgs> for BboxConfig {
    type Error = CliError;

    fn try_from(args: BboxArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_BBOX_DATABASE,
        })?;
        let mut query = BoundingBoxQuery::new(
            required(args.min_lat, ARG_MIN_LAT, ENV_BBOX_MIN_LAT)?,
            required(args.max_lat, ARG_MAX_LAT, ENV_BBOX_MAX_LAT)?,
            required(args.min_lng, ARG_MIN_LNG, ENV_BBOX_MIN_LNG)?,
            required(args.max_lng, ARG_MAX_LNG, ENV_BBOX_MAX_LNG)?,
        );
        query.source = args.source;
        query.limit = args.limit;
        Ok(Self { database, query })
    }
}

pub(crate) fn run_bbox_with(args: BboxArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = BboxConfig::try_from(merged)?;
    let db = open_existing(&config.database)?;
    let pins: Vec<CompanyPin> = Companies::new(&db).bounding_box(&config.query)?;
    write_json(writer, &pins)
}
