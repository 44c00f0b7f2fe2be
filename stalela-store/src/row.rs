//! Typed access to result rows.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Row, types::FromSql};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::StoreError;
use crate::value::{decode_date, decode_timestamp, decode_uuid};

/// A record that can be built from a result row.
pub trait FromRow: Sized {
    /// Decode one row.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when a column is missing or malformed.
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError>;
}

/// Column accessors that decode the workspace's storage formats.
///
/// Columns are looked up by name so projections and `SELECT *` decode the
/// same way.
pub struct RowReader<'row, 'stmt> {
    table: &'static str,
    row: &'row Row<'stmt>,
}

impl<'row, 'stmt> RowReader<'row, 'stmt> {
    pub(crate) const fn new(table: &'static str, row: &'row Row<'stmt>) -> Self {
        Self { table, row }
    }

    fn raw<T: FromSql>(&self, column: &'static str) -> Result<T, StoreError> {
        self.row.get(column).map_err(StoreError::query(self.table))
    }

    /// Required text column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type.
    pub fn text(&self, column: &'static str) -> Result<String, StoreError> {
        self.raw(column)
    }

    /// Nullable text column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type.
    pub fn opt_text(&self, column: &'static str) -> Result<Option<String>, StoreError> {
        self.raw(column)
    }

    /// Required integer column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type.
    pub fn int(&self, column: &'static str) -> Result<i64, StoreError> {
        self.raw(column)
    }

    /// Nullable integer column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type.
    pub fn opt_int(&self, column: &'static str) -> Result<Option<i64>, StoreError> {
        self.raw(column)
    }

    /// Required real column. Integer storage is widened.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type.
    pub fn real(&self, column: &'static str) -> Result<f64, StoreError> {
        self.raw(column)
    }

    /// Nullable real column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type.
    pub fn opt_real(&self, column: &'static str) -> Result<Option<f64>, StoreError> {
        self.raw(column)
    }

    /// Required boolean column stored as `0`/`1`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type.
    pub fn flag(&self, column: &'static str) -> Result<bool, StoreError> {
        self.raw(column)
    }

    /// Nullable boolean column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type.
    pub fn opt_flag(&self, column: &'static str) -> Result<Option<bool>, StoreError> {
        self.raw(column)
    }

    /// Required UUID column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed text yields [`StoreError::InvalidValue`].
    pub fn uuid(&self, column: &'static str) -> Result<Uuid, StoreError> {
        decode_uuid(column, &self.text(column)?)
    }

    /// Nullable UUID column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed text yields [`StoreError::InvalidValue`].
    pub fn opt_uuid(&self, column: &'static str) -> Result<Option<Uuid>, StoreError> {
        self.opt_text(column)?
            .map(|text| decode_uuid(column, &text))
            .transpose()
    }

    /// Required RFC 3339 timestamp column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed text yields [`StoreError::InvalidValue`].
    pub fn timestamp(&self, column: &'static str) -> Result<DateTime<Utc>, StoreError> {
        decode_timestamp(column, &self.text(column)?)
    }

    /// Nullable RFC 3339 timestamp column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed text yields [`StoreError::InvalidValue`].
    pub fn opt_timestamp(&self, column: &'static str) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.opt_text(column)?
            .map(|text| decode_timestamp(column, &text))
            .transpose()
    }

    /// Required `YYYY-MM-DD` column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed text yields [`StoreError::InvalidValue`].
    pub fn date(&self, column: &'static str) -> Result<NaiveDate, StoreError> {
        decode_date(column, &self.text(column)?)
    }

    /// Nullable `YYYY-MM-DD` column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed text yields [`StoreError::InvalidValue`].
    pub fn opt_date(&self, column: &'static str) -> Result<Option<NaiveDate>, StoreError> {
        self.opt_text(column)?
            .map(|text| decode_date(column, &text))
            .transpose()
    }

    /// Required categorical column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed text yields [`StoreError::InvalidValue`].
    pub fn parse<T: FromStr>(&self, column: &'static str) -> Result<T, StoreError> {
        let text = self.text(column)?;
        text.parse()
            .map_err(|_| StoreError::InvalidValue { column, value: text })
    }

    /// Nullable categorical column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed text yields [`StoreError::InvalidValue`].
    pub fn opt_parse<T: FromStr>(&self, column: &'static str) -> Result<Option<T>, StoreError> {
        match self.opt_text(column)? {
            Some(text) => text
                .parse()
                .map(Some)
                .map_err(|_| StoreError::InvalidValue { column, value: text }),
            None => Ok(None),
        }
    }

    /// Required JSON column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed JSON yields [`StoreError::Decode`].
    pub fn json<T: DeserializeOwned>(&self, column: &'static str) -> Result<T, StoreError> {
        let text = self.text(column)?;
        serde_json::from_str(&text).map_err(|source| StoreError::Decode { column, source })
    }

    /// Nullable JSON column. SQL `NULL` and JSON `null` both decode as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when the column is missing or holds an
    /// incompatible type. Malformed JSON yields [`StoreError::Decode`].
    pub fn opt_json<T: DeserializeOwned>(&self, column: &'static str) -> Result<Option<T>, StoreError> {
        match self.opt_text(column)? {
            Some(text) => serde_json::from_str(&text)
                .map_err(|source| StoreError::Decode { column, source }),
            None => Ok(None),
        }
    }
}

/// First column of a single-column projection.
impl FromRow for String {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        row.row.get(0).map_err(StoreError::query(row.table))
    }
}
