//! Dashboard aggregates over leads and blog posts.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{blog, leads};
use crate::row::{FromRow, RowReader};
use crate::value::decode_timestamp;
use crate::{Database, Direction, Filter, Lead, Select, SourceCount, StoreError};

/// Leads returned by [`Metrics::recent_leads`] when no limit is given.
const DEFAULT_RECENT_LEADS: u64 = 10;

/// Posts returned by [`Metrics::recent_blog_posts`] when no limit is given.
const DEFAULT_RECENT_POSTS: u64 = 5;

/// Longest window, in days before `today`, that [`Metrics::leads_over_time`]
/// will render.
pub const MAX_SERIES_DAYS: u32 = 366;

/// Headline counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Every lead ever captured.
    pub total_leads: u64,
    /// Leads created since the first day of the current month (UTC).
    pub leads_this_month: u64,
    /// Posts visible on the public site.
    pub published_posts: u64,
    /// Posts still being edited.
    pub draft_posts: u64,
}

/// Leads created on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// Calendar day in UTC.
    pub date: NaiveDate,
    /// Leads created on `date`.
    pub count: u64,
}

/// Projection of a blog post for the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentPost {
    /// Post identifier.
    pub id: Uuid,
    /// URL slug.
    pub slug: String,
    /// Headline.
    pub title: String,
    /// Whether the post is live.
    pub published: bool,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for RecentPost {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            slug: row.text("slug")?,
            title: row.text("title")?,
            published: row.flag("published")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Read-only dashboard queries.
#[derive(Debug, Clone, Copy)]
pub struct Metrics<'db> {
    db: &'db Database,
}

impl<'db> Metrics<'db> {
    /// Borrow `db` for dashboard queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Counts as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a count query fails.
    pub fn summary(&self, now: DateTime<Utc>) -> Result<MetricsSnapshot, StoreError> {
        let today = now.date_naive();
        let month_start = today.with_day(1).unwrap_or(today);
        let total_leads = self.db.count(&Select::from(leads::TABLE))?;
        let leads_this_month = self.db.count(
            &Select::from(leads::TABLE)
                .filter(Filter::new().gte("created_at", start_of(month_start))),
        )?;
        let total_posts = self.db.count(&Select::from(blog::TABLE))?;
        let published_posts = self.db.count(
            &Select::from(blog::TABLE).filter(Filter::new().eq("published", true)),
        )?;
        Ok(MetricsSnapshot {
            total_leads,
            leads_this_month,
            published_posts,
            draft_posts: total_posts.saturating_sub(published_posts),
        })
    }

    /// Lead counts per source, largest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the grouping query fails.
    pub fn leads_by_source(&self) -> Result<Vec<SourceCount>, StoreError> {
        Ok(self
            .db
            .group_counts(leads::TABLE, "source", Filter::new())?
            .into_iter()
            .map(|(source, count)| SourceCount { source, count })
            .collect())
    }

    /// Daily lead counts from `today - days` to `today` inclusive.
    ///
    /// Days without leads appear with a zero count. Windows longer than
    /// [`MAX_SERIES_DAYS`] are shortened to that length.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails or a stored timestamp
    /// cannot be parsed.
    pub fn leads_over_time(&self, days: u32, today: NaiveDate) -> Result<Vec<DailyCount>, StoreError> {
        let since = today
            .checked_sub_days(Days::new(u64::from(days.min(MAX_SERIES_DAYS))))
            .unwrap_or(NaiveDate::MIN);
        let select = Select::from(leads::TABLE)
            .columns(&["created_at"])
            .filter(Filter::new().gte("created_at", start_of(since)))
            .order_by("created_at", Direction::Ascending);
        let stamps: Vec<String> = self.db.fetch(&select)?;

        let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for stamp in &stamps {
            let day = decode_timestamp("created_at", stamp)?.date_naive();
            *by_day.entry(day).or_default() += 1;
        }

        Ok(since
            .iter_days()
            .take_while(|day| *day <= today)
            .map(|date| DailyCount {
                date,
                count: by_day.get(&date).copied().unwrap_or_default(),
            })
            .collect())
    }

    /// Newest leads first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn recent_leads(&self, limit: Option<u64>) -> Result<Vec<Lead>, StoreError> {
        let select = Select::from(leads::TABLE)
            .order_by("created_at", Direction::Descending)
            .limit(limit.unwrap_or(DEFAULT_RECENT_LEADS));
        self.db.fetch(&select)
    }

    /// Most recently edited posts first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn recent_blog_posts(&self, limit: Option<u64>) -> Result<Vec<RecentPost>, StoreError> {
        let select = Select::from(blog::TABLE)
            .columns(&["id", "slug", "title", "published", "updated_at"])
            .order_by("updated_at", Direction::Descending)
            .limit(limit.unwrap_or(DEFAULT_RECENT_POSTS));
        self.db.fetch(&select)
    }
}
