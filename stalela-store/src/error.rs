//! Error type shared by every table facade.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while opening, bootstrapping or querying the database.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening the SQLite file failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    Open {
        /// Location of the database on disk.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The directory holding the database could not be created.
    #[error("failed to create database directory for {path}: {source}")]
    CreateDirectory {
        /// Database path whose parent was being created.
        path: Utf8PathBuf,
        /// IO failure.
        #[source]
        source: std::io::Error,
    },
    /// A schema bootstrap statement failed.
    #[error("schema bootstrap failed during {step}: {source}")]
    Bootstrap {
        /// Human-readable description of the failing step.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement against `table` failed.
    #[error("query on {table} failed: {source}")]
    Query {
        /// Table the statement targeted.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A single-row read or write matched nothing.
    #[error("no row in {table} matches {key}")]
    NotFound {
        /// Table that was queried.
        table: &'static str,
        /// Lookup key, rendered for display.
        key: String,
    },
    /// A JSON column value could not be serialised.
    #[error("failed to encode column {column}: {source}")]
    Encode {
        /// Column being written.
        column: &'static str,
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A JSON column held invalid or unexpected JSON.
    #[error("failed to decode column {column}: {source}")]
    Decode {
        /// Column being read.
        column: &'static str,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A text column held a value outside its expected format.
    #[error("column {column} holds an invalid value {value:?}")]
    InvalidValue {
        /// Column being read.
        column: &'static str,
        /// Offending text.
        value: String,
    },
    /// A previous caller panicked while holding the connection lock.
    #[error("database connection lock was poisoned")]
    ConnectionPoisoned,
}

impl StoreError {
    pub(crate) fn query(table: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Query { table, source }
    }

    pub(crate) fn not_found(table: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            table,
            key: key.to_string(),
        }
    }

    /// Whether this error reports a missing row.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
