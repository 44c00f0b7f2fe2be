//! `nearby` command: rank businesses by distance from a point.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use stalela_core::ProximityResult;
use stalela_store::{Companies, Company};

use crate::{
    ARG_DATABASE, ARG_LAT, ARG_LIMIT, ARG_LNG, ARG_RADIUS_KM, CliError, ENV_NEARBY_DATABASE,
    ENV_NEARBY_LAT, ENV_NEARBY_LNG, ENV_NEARBY_RADIUS_KM, open_existing, write_json,
};

/// CLI arguments for the `nearby` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Find the businesses within a great-circle radius of a \
                 point and print them as JSON, nearest first, each with its \
                 distance in kilometres.",
    about = "List businesses near a point"
)]
#[ortho_config(prefix = "STALELA")]
pub(crate) struct NearbyArgs {
    /// Path to the SQLite database file.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Latitude of the search centre in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the search centre in degrees.
    #[arg(long = ARG_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lng: Option<f64>,
    /// Search radius in kilometres.
    #[arg(long = ARG_RADIUS_KM, value_name = "km")]
    #[serde(default)]
    pub(crate) radius_km: Option<f64>,
    /// Maximum number of results (defaults to ten).
    #[arg(long = ARG_LIMIT, value_name = "n")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

/// Resolved `nearby` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NearbyConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) center: Coord<f64>,
    pub(crate) radius_km: f64,
    pub(crate) limit: Option<usize>,
}

impl TryFrom<NearbyArgs> for NearbyConfig {
    type Error = CliError;

    fn try_from(args: NearbyArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_NEARBY_DATABASE,
        })?;
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_NEARBY_LAT,
        })?;
        let lng = args.lng.ok_or(CliError::MissingArgument {
            field: ARG_LNG,
            env: ENV_NEARBY_LNG,
        })?;
        let radius_km = args.radius_km.ok_or(CliError::MissingArgument {
            field: ARG_RADIUS_KM,
            env: ENV_NEARBY_RADIUS_KM,
        })?;
        Ok(Self {
            database,
            center: Coord { x: lng, y: lat },
            radius_km,
            limit: args.limit,
        })
    }
}

pub(crate) fn run_nearby_with(args: NearbyArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = NearbyConfig::try_from(merged)?;
    let results = find_nearby(&config)?;
    write_json(writer, &results)
}

pub(crate) fn find_nearby(
    config: &NearbyConfig,
) -> Result<Vec<ProximityResult<Company>>, CliError> {
    let db = open_existing(&config.database)?;
    Ok(Companies::new(&db).nearby(config.center, config.radius_km, config.limit)?)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<NearbyConfig, CliError> {
    let merged = NearbyArgs::merge_from_layers(layers).map_err(CliError::from)?;
    NearbyConfig::try_from(merged)
}
