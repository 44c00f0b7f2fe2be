//! Daily sales briefings: one outreach opportunity per company per day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DEFAULT_DATE_LIMIT, by_id};
use crate::row::{FromRow, RowReader};
use crate::value::{decode_date, text_enum};
use crate::{Changes, Database, Direction, Filter, Page, Select, StoreError};

const TABLE: &str = "daily_briefings";

/// Priority recorded when a new briefing names none. Lower is more urgent.
const DEFAULT_PRIORITY: i64 = 5;

text_enum! {
    /// Review state of a briefing.
    #[derive(Default)]
    pub enum BriefingStatus {
        /// Waiting for review.
        #[default]
        Pending = "pending",
        /// Checked and ready to send.
        Reviewed = "reviewed",
        /// Outreach went out.
        Sent = "sent",
        /// Dismissed for the day.
        Skipped = "skipped",
    }
}

/// Stored outreach opportunity for one company on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBriefing {
    /// Row identifier.
    pub id: Uuid,
    /// Day the briefing belongs to.
    pub date: NaiveDate,
    /// Company the opportunity concerns.
    pub company_id: Uuid,
    /// Company name at the time of writing.
    pub company_name: String,
    /// Kind of opportunity, such as `new_listing`.
    pub opportunity_type: String,
    /// Why now is a good moment to reach out.
    pub opportunity_summary: String,
    /// Background gathered on the company.
    pub research_summary: Option<String>,
    /// Suggested email subject.
    pub email_draft_subject: Option<String>,
    /// Suggested email body.
    pub email_draft_body: Option<String>,
    /// Suggested phone script.
    pub call_script: Option<String>,
    /// Urgency; lower is more urgent.
    pub priority: i64,
    /// Review state.
    pub status: BriefingStatus,
    /// When someone reviewed the briefing.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FromRow for DailyBriefing {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            date: row.date("date")?,
            company_id: row.uuid("company_id")?,
            company_name: row.text("company_name")?,
            opportunity_type: row.text("opportunity_type")?,
            opportunity_summary: row.text("opportunity_summary")?,
            research_summary: row.opt_text("research_summary")?,
            email_draft_subject: row.opt_text("email_draft_subject")?,
            email_draft_body: row.opt_text("email_draft_body")?,
            call_script: row.opt_text("call_script")?,
            priority: row.int("priority")?,
            status: row.parse("status")?,
            reviewed_at: row.opt_timestamp("reviewed_at")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

/// Fields for [`Briefings::create`] and [`Briefings::upsert`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBriefing {
    /// Today (UTC) when absent.
    pub date: Option<NaiveDate>,
    /// Company the opportunity concerns.
    pub company_id: Uuid,
    /// Company name at the time of writing.
    pub company_name: String,
    /// Kind of opportunity, such as `new_listing`.
    pub opportunity_type: String,
    /// Why now is a good moment to reach out.
    pub opportunity_summary: String,
    /// Background gathered on the company.
    pub research_summary: Option<String>,
    /// Suggested email subject.
    pub email_draft_subject: Option<String>,
    /// Suggested email body.
    pub email_draft_body: Option<String>,
    /// Suggested phone script.
    pub call_script: Option<String>,
    /// Five when absent.
    pub priority: Option<i64>,
    /// Initial review state.
    pub status: BriefingStatus,
}

impl NewBriefing {
    fn changes(&self) -> Changes {
        let now = Utc::now();
        Changes::new()
            .set("id", Uuid::new_v4())
            .set("date", self.date.unwrap_or_else(|| now.date_naive()))
            .set("company_id", self.company_id)
            .set("company_name", &self.company_name)
            .set("opportunity_type", &self.opportunity_type)
            .set("opportunity_summary", &self.opportunity_summary)
            .set("research_summary", &self.research_summary)
            .set("email_draft_subject", &self.email_draft_subject)
            .set("email_draft_body", &self.email_draft_body)
            .set("call_script", &self.call_script)
            .set("priority", self.priority.unwrap_or(DEFAULT_PRIORITY))
            .set("status", self.status)
            .set("created_at", now)
    }
}

/// Review update; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BriefingUpdate {
    /// New review state.
    pub status: Option<BriefingStatus>,
    /// New or cleared email subject.
    pub email_draft_subject: Option<Option<String>>,
    /// New or cleared email body.
    pub email_draft_body: Option<Option<String>>,
    /// New or cleared phone script.
    pub call_script: Option<Option<String>>,
    /// New urgency.
    pub priority: Option<i64>,
    /// New or cleared review time.
    pub reviewed_at: Option<Option<DateTime<Utc>>>,
}

/// Briefings per status for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefingStats {
    /// Every briefing for the day.
    pub total: u64,
    /// Briefings awaiting review.
    pub pending: u64,
    /// Reviewed briefings.
    pub reviewed: u64,
    /// Briefings acted on.
    pub sent: u64,
    /// Dismissed briefings.
    pub skipped: u64,
}

/// Facade over the `daily_briefings` table.
#[derive(Debug, Clone, Copy)]
pub struct Briefings<'db> {
    db: &'db Database,
}

impl<'db> Briefings<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// A day's briefings, most urgent first, then by company name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list_by_date(
        &self,
        date: NaiveDate,
        status: Option<BriefingStatus>,
    ) -> Result<Page<DailyBriefing>, StoreError> {
        let select = Select::from(TABLE)
            .filter(Filter::new().eq("date", date).eq_opt("status", status))
            .order_by("priority", Direction::Ascending)
            .order_by("company_name", Direction::Ascending);
        self.db.page(&select)
    }

    /// Days with briefings, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list_dates(&self, limit: Option<u64>) -> Result<Vec<NaiveDate>, StoreError> {
        let select = Select::from(TABLE)
            .columns(&["date"])
            .distinct()
            .order_by("date", Direction::Descending)
            .limit(limit.unwrap_or(DEFAULT_DATE_LIMIT));
        let dates: Vec<String> = self.db.fetch(&select)?;
        dates
            .iter()
            .map(|text| decode_date("date", text))
            .collect()
    }

    /// Fetch one briefing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the query fails.
    pub fn get(&self, id: Uuid) -> Result<DailyBriefing, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Store a briefing and return its identifier.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::Query`] when the company already has a
    /// briefing for that day.
    pub fn create(&self, briefing: &NewBriefing) -> Result<Uuid, StoreError> {
        let stored: DailyBriefing = self.db.insert(TABLE, &briefing.changes())?;
        Ok(stored.id)
    }

    /// Insert, or replace the company's briefing for that day.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a value cannot be encoded or the
    /// write fails.
    pub fn upsert(&self, briefing: &NewBriefing) -> Result<Uuid, StoreError> {
        let stored: DailyBriefing =
            self.db
                .upsert(TABLE, &briefing.changes(), &["company_id", "date"])?;
        Ok(stored.id)
    }

    /// Apply a review update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the write fails.
    pub fn update(&self, id: Uuid, update: &BriefingUpdate) -> Result<DailyBriefing, StoreError> {
        let changes = Changes::new()
            .set_opt("status", update.status)
            .set_opt("email_draft_subject", update.email_draft_subject.as_ref())
            .set_opt("email_draft_body", update.email_draft_body.as_ref())
            .set_opt("call_script", update.call_script.as_ref())
            .set_opt("priority", update.priority)
            .set_opt("reviewed_at", update.reviewed_at);
        self.db.update(TABLE, &by_id(id), &changes, id)
    }

    /// Counts per status for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn stats_for_date(&self, date: NaiveDate) -> Result<BriefingStats, StoreError> {
        let groups = self
            .db
            .group_counts(TABLE, "status", Filter::new().eq("date", date))?;
        let mut stats = BriefingStats::default();
        for (status, count) in groups {
            stats.total += count;
            let slot = match status.parse() {
                Ok(BriefingStatus::Pending) => &mut stats.pending,
                Ok(BriefingStatus::Reviewed) => &mut stats.reviewed,
                Ok(BriefingStatus::Sent) => &mut stats.sent,
                Ok(BriefingStatus::Skipped) => &mut stats.skipped,
                Err(_) => {
                    return Err(StoreError::InvalidValue {
                        column: "status",
                        value: status,
                    });
                }
            };
            *slot += count;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::fixtures::db;
    use rstest::rstest;

    fn day(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("valid date")
    }

    fn briefing(date: &str, name: &str, priority: Option<i64>) -> NewBriefing {
        NewBriefing {
            date: Some(day(date)),
            company_id: Uuid::new_v4(),
            company_name: name.into(),
            opportunity_type: "no_website".into(),
            opportunity_summary: format!("{name} has no website"),
            priority,
            ..NewBriefing::default()
        }
    }

    #[rstest]
    fn created_briefings_take_defaults(db: Database) {
        let briefings = Briefings::new(&db);
        let id = briefings
            .create(&NewBriefing {
                date: None,
                ..briefing("2025-01-01", "Acme", None)
            })
            .expect("create");
        let stored = briefings.get(id).expect("get");
        assert_eq!(stored.priority, 5);
        assert_eq!(stored.status, BriefingStatus::Pending);
        assert_eq!(stored.date, Utc::now().date_naive());
    }

    #[rstest]
    fn day_listing_orders_by_priority_then_name(db: Database) {
        let briefings = Briefings::new(&db);
        for (name, priority) in [("Zulu Bakery", Some(1)), ("Bolt Electrical", None), ("Acme", Some(5))] {
            briefings
                .create(&briefing("2025-06-01", name, priority))
                .expect("create");
        }
        briefings
            .create(&briefing("2025-06-02", "Elsewhere", Some(1)))
            .expect("create");

        let page = briefings
            .list_by_date(day("2025-06-01"), None)
            .expect("list");
        let names: Vec<_> = page.items.iter().map(|b| b.company_name.as_str()).collect();
        assert_eq!(names, vec!["Zulu Bakery", "Acme", "Bolt Electrical"]);
        assert_eq!(page.total, 3);
    }

    #[rstest]
    fn upsert_keeps_one_briefing_per_company_and_day(db: Database) {
        let briefings = Briefings::new(&db);
        let original = briefing("2025-06-01", "Acme", None);
        let first = briefings.upsert(&original).expect("insert");
        let second = briefings
            .upsert(&NewBriefing {
                opportunity_summary: "Rewritten".into(),
                ..original.clone()
            })
            .expect("replace");
        assert_eq!(first, second);
        assert_eq!(briefings.get(first).expect("get").opportunity_summary, "Rewritten");
        assert!(briefings.create(&original).is_err());
    }

    #[rstest]
    fn dates_are_distinct_and_newest_first(db: Database) {
        let briefings = Briefings::new(&db);
        for (date, name) in [("2025-06-01", "A"), ("2025-06-03", "B"), ("2025-06-03", "C"), ("2025-06-02", "D")] {
            briefings.create(&briefing(date, name, None)).expect("create");
        }
        assert_eq!(
            briefings.list_dates(None).expect("dates"),
            vec![day("2025-06-03"), day("2025-06-02"), day("2025-06-01")]
        );
        assert_eq!(briefings.list_dates(Some(1)).expect("dates").len(), 1);
    }

    #[rstest]
    fn review_updates_feed_the_stats(db: Database) {
        let briefings = Briefings::new(&db);
        let ids: Vec<_> = ["A", "B", "C"]
            .into_iter()
            .map(|name| {
                briefings
                    .create(&briefing("2025-06-01", name, None))
                    .expect("create")
            })
            .collect();
        let reviewed = briefings
            .update(
                ids[0],
                &BriefingUpdate {
                    status: Some(BriefingStatus::Sent),
                    reviewed_at: Some(Some(Utc::now())),
                    ..BriefingUpdate::default()
                },
            )
            .expect("update");
        assert!(reviewed.reviewed_at.is_some());
        briefings
            .update(
                ids[1],
                &BriefingUpdate {
                    status: Some(BriefingStatus::Skipped),
                    ..BriefingUpdate::default()
                },
            )
            .expect("update");

        assert_eq!(
            briefings.stats_for_date(day("2025-06-01")).expect("stats"),
            BriefingStats {
                total: 3,
                pending: 1,
                reviewed: 0,
                sent: 1,
                skipped: 1
            }
        );
        assert_eq!(
            briefings.stats_for_date(day("2025-06-02")).expect("stats"),
            BriefingStats::default()
        );
    }
}
