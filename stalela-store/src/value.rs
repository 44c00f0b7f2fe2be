//! Conversions between Rust values and SQLite storage classes.
//!
//! Identifiers are stored as hyphenated UUID text, timestamps as RFC 3339
//! UTC text with fixed microsecond precision (so lexical order matches
//! chronological order), dates as `YYYY-MM-DD` and booleans as integers.
//! JSON columns hold serialised text.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Value;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::StoreError;

/// A Rust value that can be bound as a statement parameter.
pub trait SqlParam {
    /// Convert into an owned SQLite value.
    fn to_sql_value(&self) -> Value;
}

impl<T: SqlParam + ?Sized> SqlParam for &T {
    fn to_sql_value(&self) -> Value {
        (**self).to_sql_value()
    }
}

impl<T: SqlParam> SqlParam for Option<T> {
    fn to_sql_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, SqlParam::to_sql_value)
    }
}

impl SqlParam for str {
    fn to_sql_value(&self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl SqlParam for String {
    fn to_sql_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl SqlParam for i64 {
    fn to_sql_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl SqlParam for f64 {
    fn to_sql_value(&self) -> Value {
        Value::Real(*self)
    }
}

impl SqlParam for bool {
    fn to_sql_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }
}

impl SqlParam for Uuid {
    fn to_sql_value(&self) -> Value {
        Value::Text(self.hyphenated().to_string())
    }
}

impl SqlParam for DateTime<Utc> {
    fn to_sql_value(&self) -> Value {
        Value::Text(encode_timestamp(self))
    }
}

impl SqlParam for NaiveDate {
    fn to_sql_value(&self) -> Value {
        Value::Text(self.format(DATE_FORMAT).to_string())
    }
}

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn encode_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(column: &'static str, text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| invalid(column, text))
}

pub(crate) fn decode_date(column: &'static str, text: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid(column, text))
}

pub(crate) fn decode_uuid(column: &'static str, text: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(text).map_err(|_| invalid(column, text))
}

/// Serialise `value` as JSON text for `column`.
pub(crate) fn encode_json<T>(column: &'static str, value: &T) -> Result<Value, StoreError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(value)
        .map(Value::Text)
        .map_err(|source| StoreError::Encode { column, source })
}

fn invalid(column: &'static str, text: &str) -> StoreError {
    StoreError::InvalidValue {
        column,
        value: text.to_owned(),
    }
}

/// Text did not name any variant of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{value:?} is not a valid {kind}")]
pub struct UnknownVariant {
    /// Rust type that rejected the text.
    pub kind: &'static str,
    /// The rejected text.
    pub value: String,
}

/// Declare a categorical column type stored as lowercase text.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Text stored in the database.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::value::UnknownVariant;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                match text {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::value::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_owned(),
                    }),
                }
            }
        }

        impl $crate::value::SqlParam for $name {
            fn to_sql_value(&self) -> ::rusqlite::types::Value {
                ::rusqlite::types::Value::Text(self.as_str().to_owned())
            }
        }
    };
}

pub(crate) use text_enum;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    text_enum! {
        /// Test-only enum.
        enum Colour {
            Red = "red",
            DeepBlue = "deep_blue",
        }
    }

    #[rstest]
    fn timestamps_sort_lexically() {
        let early = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).single().expect("valid");
        let late = early + chrono::Duration::microseconds(1);
        assert!(encode_timestamp(&early) < encode_timestamp(&late));
        assert_eq!(encode_timestamp(&early), "2025-01-02T03:04:05.000000Z");
    }

    #[rstest]
    fn timestamps_round_trip_through_text() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).single().expect("valid");
        let text = encode_timestamp(&at);
        assert_eq!(decode_timestamp("created_at", &text).expect("decode"), at);
    }

    #[rstest]
    #[case("not a time")]
    #[case("2025-13-01T00:00:00Z")]
    fn malformed_timestamps_are_invalid(#[case] text: &str) {
        let err = decode_timestamp("created_at", text).expect_err("should fail");
        assert!(matches!(err, StoreError::InvalidValue { column: "created_at", .. }));
    }

    #[rstest]
    fn options_bind_null() {
        assert_eq!(None::<i64>.to_sql_value(), Value::Null);
        assert_eq!(Some(true).to_sql_value(), Value::Integer(1));
    }

    #[rstest]
    fn enums_use_their_storage_text() {
        assert_eq!(Colour::DeepBlue.to_string(), "deep_blue");
        assert_eq!("red".parse::<Colour>(), Ok(Colour::Red));
        let err = "green".parse::<Colour>().expect_err("unknown");
        assert_eq!(err.kind, "Colour");
        assert_eq!(
            serde_json::to_string(&Colour::DeepBlue).expect("serialise"),
            "\"deep_blue\""
        );
        assert_eq!(Colour::ALL.len(), 2);
    }

    #[rstest]
    fn dates_use_iso_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).expect("valid");
        assert_eq!(date.to_sql_value(), Value::Text("2025-03-07".into()));
        assert_eq!(decode_date("date", "2025-03-07").expect("decode"), date);
    }
}
