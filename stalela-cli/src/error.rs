//! Error types emitted by the Stalela CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use stalela_core::ProximityError;
use stalela_store::StoreError;
use thiserror::Error;

/// Errors emitted by the Stalela CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The database file a read-only command needs does not exist.
    #[error("database {path:?} does not exist (run `stalela init` first)")]
    MissingDatabase { path: Utf8PathBuf },
    /// The database path could not be inspected due to an IO error.
    #[error("failed to inspect database path {path:?}: {source}")]
    InspectDatabase {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening or querying the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The proximity search rejected its input or its store failed.
    #[error(transparent)]
    Proximity(#[from] ProximityError<StoreError>),
    /// Serialising command output to JSON failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
