//! Cached research reports on directory companies.

use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::row::{FromRow, RowReader};
use crate::{Changes, Database, Direction, Filter, Select, StoreError};

const TABLE: &str = "company_research";

/// Model recorded when a report names none.
pub const DEFAULT_RESEARCH_MODEL: &str = "qwen3-max";

/// Age in days beyond which [`Research::latest`] ignores a report.
pub const DEFAULT_RESEARCH_MAX_AGE_DAYS: u32 = 7;

/// Reports returned by [`Research::list`] when no limit is given.
pub const DEFAULT_RESEARCH_LIMIT: u64 = 10;

/// A stored research report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyResearch {
    /// Row identifier.
    pub id: Uuid,
    /// Company the report describes.
    pub company_id: Uuid,
    /// Markdown report.
    pub report: String,
    /// Model that wrote the report.
    pub model: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FromRow for CompanyResearch {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            company_id: row.uuid("company_id")?,
            report: row.text("report")?,
            model: row.text("model")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

/// Facade over the `company_research` table.
#[derive(Debug, Clone, Copy)]
pub struct Research<'db> {
    db: &'db Database,
}

impl<'db> Research<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Newest report on `company_id` written no more than `max_age_days`
    /// (default [`DEFAULT_RESEARCH_MAX_AGE_DAYS`]) before `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn latest(
        &self,
        company_id: Uuid,
        max_age_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Option<CompanyResearch>, StoreError> {
        let days = max_age_days.unwrap_or(DEFAULT_RESEARCH_MAX_AGE_DAYS);
        // An age reaching past the earliest representable instant keeps everything.
        let cutoff = now.checked_sub_days(Days::new(u64::from(days)));
        let select = Select::from(TABLE)
            .filter(
                Filter::new()
                    .eq("company_id", company_id)
                    .gte_opt("created_at", cutoff),
            )
            .order_by("created_at", Direction::Descending);
        self.db.fetch_optional(&select)
    }

    /// Store a new report. `model` defaults to [`DEFAULT_RESEARCH_MODEL`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the company does not exist or the
    /// insert fails.
    pub fn save(
        &self,
        company_id: Uuid,
        report: &str,
        model: Option<&str>,
    ) -> Result<CompanyResearch, StoreError> {
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("company_id", company_id)
            .set("report", report)
            .set("model", model.unwrap_or(DEFAULT_RESEARCH_MODEL))
            .set("created_at", Utc::now());
        self.db.insert(TABLE, &changes)
    }

    /// Past reports on a company, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(
        &self,
        company_id: Uuid,
        limit: Option<u64>,
    ) -> Result<Vec<CompanyResearch>, StoreError> {
        let select = Select::from(TABLE)
            .filter(Filter::new().eq("company_id", company_id))
            .order_by("created_at", Direction::Descending)
            .limit(limit.unwrap_or(DEFAULT_RESEARCH_LIMIT));
        self.db.fetch(&select)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::fixtures::db;
    use crate::{Companies, CompanySource, NewCompany};
    use chrono::Duration;
    use rstest::rstest;
    use std::thread::sleep;

    fn company_id(db: &Database) -> Uuid {
        Companies::new(db)
            .create(&NewCompany::new(CompanySource::Yep, "y-1", "Acme Plumbing"))
            .expect("create company")
            .id
    }

    #[rstest]
    fn save_records_the_default_model(db: Database) {
        let company = company_id(&db);
        let research = Research::new(&db);
        let stored = research.save(company, "# Acme", None).expect("save");
        assert_eq!(stored.model, DEFAULT_RESEARCH_MODEL);
        let named = research
            .save(company, "# Acme again", Some("local-llm"))
            .expect("save");
        assert_eq!(named.model, "local-llm");
    }

    #[rstest]
    fn latest_prefers_the_newest_fresh_report(db: Database) {
        let company = company_id(&db);
        let research = Research::new(&db);
        research.save(company, "first", None).expect("save");
        sleep(std::time::Duration::from_millis(2));
        let newest = research.save(company, "second", None).expect("save");

        let now = Utc::now();
        assert_eq!(
            research.latest(company, None, now).expect("latest"),
            Some(newest)
        );
        assert!(research.latest(Uuid::new_v4(), None, now).expect("latest").is_none());
    }

    #[rstest]
    fn stale_reports_are_ignored(db: Database) {
        let company = company_id(&db);
        let research = Research::new(&db);
        research.save(company, "report", None).expect("save");

        let next_week = Utc::now() + Duration::days(8);
        assert!(research.latest(company, None, next_week).expect("latest").is_none());
        assert!(research.latest(company, Some(30), next_week).expect("latest").is_some());
        assert!(
            research
                .latest(company, Some(u32::MAX), next_week)
                .expect("latest")
                .is_some()
        );
    }

    #[rstest]
    fn listing_is_capped_and_newest_first(db: Database) {
        let company = company_id(&db);
        let research = Research::new(&db);
        for report in ["a", "b", "c"] {
            research.save(company, report, None).expect("save");
            sleep(std::time::Duration::from_millis(2));
        }
        let reports: Vec<_> = research
            .list(company, Some(2))
            .expect("list")
            .into_iter()
            .map(|r| r.report)
            .collect();
        assert_eq!(reports, vec!["c", "b"]);
        assert_eq!(research.list(company, None).expect("list").len(), 3);
    }

    #[rstest]
    fn reports_need_an_existing_company(db: Database) {
        let err = Research::new(&db)
            .save(Uuid::new_v4(), "orphan", None)
            .expect_err("unknown company");
        assert!(matches!(err, StoreError::Query { .. }));
    }
}
