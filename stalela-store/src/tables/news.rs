//! One news digest per day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DEFAULT_DATE_LIMIT;
use crate::row::{FromRow, RowReader};
use crate::value::decode_date;
use crate::{Changes, Database, Direction, Filter, Select, StoreError};

const TABLE: &str = "daily_news";

/// Stored digest for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyNews {
    /// Row identifier.
    pub id: Uuid,
    /// Day the digest covers.
    pub date: NaiveDate,
    /// Markdown body.
    pub content: String,
    /// Topic tags.
    pub topics: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FromRow for DailyNews {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            date: row.date("date")?,
            content: row.text("content")?,
            topics: row.json("topics")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

/// Digest to store for a day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsDigest {
    /// Today (UTC) when absent.
    pub date: Option<NaiveDate>,
    /// Markdown body.
    pub content: String,
    /// Topic tags.
    pub topics: Vec<String>,
}

/// Facade over the `daily_news` table.
#[derive(Debug, Clone, Copy)]
pub struct News<'db> {
    db: &'db Database,
}

impl<'db> News<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Digest for `date`, if one was stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn get_by_date(&self, date: NaiveDate) -> Result<Option<DailyNews>, StoreError> {
        self.db
            .fetch_optional(&Select::from(TABLE).filter(Filter::new().eq("date", date)))
    }

    /// Days with a digest, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list_dates(&self, limit: Option<u64>) -> Result<Vec<NaiveDate>, StoreError> {
        let select = Select::from(TABLE)
            .columns(&["date"])
            .order_by("date", Direction::Descending)
            .limit(limit.unwrap_or(DEFAULT_DATE_LIMIT));
        let dates: Vec<String> = self.db.fetch(&select)?;
        dates.iter().map(|text| decode_date("date", text)).collect()
    }

    /// Insert or replace the digest for its day and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a value cannot be encoded or the
    /// write fails.
    pub fn upsert(&self, digest: &NewsDigest) -> Result<Uuid, StoreError> {
        let now = Utc::now();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("date", digest.date.unwrap_or_else(|| now.date_naive()))
            .set("content", &digest.content)
            .set_json("topics", &digest.topics)?
            .set("created_at", now);
        let stored: DailyNews = self.db.upsert(TABLE, &changes, &["date"])?;
        Ok(stored.id)
    }
}
