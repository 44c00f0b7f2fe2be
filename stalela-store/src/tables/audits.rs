//! Website audits run for a tenant and their typed reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use super::by_id;
use crate::row::{FromRow, RowReader};
use crate::value::text_enum;
use crate::{Changes, Database, Direction, Filter, Select, StoreError};

const TABLE: &str = "website_audits";

text_enum! {
    /// Progress of an audit through crawling and analysis.
    #[derive(Default)]
    pub enum AuditStatus {
        /// Queued and not yet started.
        #[default]
        Pending = "pending",
        /// Fetching pages from the site.
        Crawling = "crawling",
        /// Crawl finished; the report is being written.
        Analyzing = "analyzing",
        /// Report available.
        Complete = "complete",
        /// Stopped with an error message.
        Failed = "failed",
    }
}

/// One scored section of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSection {
    /// Section heading.
    pub title: String,
    /// Findings as prose.
    pub content: String,
    /// Optional section score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A competitor noticed while analysing the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorSignal {
    /// Competitor name.
    pub name: String,
    /// Competitor site, when one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// What the competitor does differently.
    pub notes: String,
}

/// Analysis produced once an audit completes. Stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// What the business says about itself.
    pub brand_summary: String,
    /// Where the business sits against its market.
    pub market_positioning: String,
    /// 0 to 100.
    pub ad_readiness_score: f64,
    /// Suggested next steps, most important first.
    pub recommendations: Vec<String>,
    /// Competitors spotted during analysis.
    pub competitor_signals: Vec<CompetitorSignal>,
    /// Detailed findings.
    pub sections: Vec<AuditSection>,
}

/// Stored audit of one tenant website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteAudit {
    /// Audit identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Audited address.
    pub url: String,
    /// Current progress.
    pub status: AuditStatus,
    /// Analysis, once complete.
    pub report: Option<AuditReport>,
    /// Raw crawler output.
    pub crawl_data: Option<Json>,
    /// Reason for a failed audit.
    pub error_message: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for WebsiteAudit {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            tenant_id: row.uuid("tenant_id")?,
            url: row.text("url")?,
            status: row.parse("status")?,
            report: row.opt_json("report")?,
            crawl_data: row.opt_json("crawl_data")?,
            error_message: row.opt_text("error_message")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Fields for [`Audits::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAudit {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Address to audit.
    pub url: String,
    /// Initial status, usually [`AuditStatus::Pending`].
    pub status: AuditStatus,
    /// Report, when created already complete.
    pub report: Option<AuditReport>,
    /// Raw crawler output.
    pub crawl_data: Option<Json>,
    /// Failure reason.
    pub error_message: Option<String>,
}

/// Progress update; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditUpdate {
    /// New status.
    pub status: Option<AuditStatus>,
    /// New or cleared report.
    pub report: Option<Option<AuditReport>>,
    /// New or cleared crawler output.
    pub crawl_data: Option<Option<Json>>,
    /// New or cleared failure reason.
    pub error_message: Option<Option<String>>,
}

/// Facade over the `website_audits` table.
#[derive(Debug, Clone, Copy)]
pub struct Audits<'db> {
    db: &'db Database,
}

impl<'db> Audits<'db> {
    /// Borrow `db` for audit queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Insert a new audit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the report cannot be encoded or the insert
    /// fails.
    pub fn create(&self, audit: &NewAudit) -> Result<WebsiteAudit, StoreError> {
        let now = Utc::now();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("tenant_id", audit.tenant_id)
            .set("url", &audit.url)
            .set("status", audit.status)
            .set_json_or_null("report", audit.report.as_ref())?
            .set_json_or_null("crawl_data", audit.crawl_data.as_ref())?
            .set("error_message", &audit.error_message)
            .set("created_at", now)
            .set("updated_at", now);
        self.db.insert(TABLE, &changes)
    }

    /// Fetch one audit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no audit has `id`.
    pub fn get(&self, id: Uuid) -> Result<WebsiteAudit, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    fn for_tenant(tenant_id: Uuid) -> Select {
        Select::from(TABLE)
            .filter(Filter::new().eq("tenant_id", tenant_id))
            .order_by("created_at", Direction::Descending)
    }

    /// Most recent audit of a tenant, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn latest(&self, tenant_id: Uuid) -> Result<Option<WebsiteAudit>, StoreError> {
        self.db.fetch_optional(&Self::for_tenant(tenant_id))
    }

    /// Every audit of a tenant, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self, tenant_id: Uuid) -> Result<Vec<WebsiteAudit>, StoreError> {
        self.db.fetch(&Self::for_tenant(tenant_id))
    }

    /// Apply a progress update and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no audit has `id`.
    pub fn update(&self, id: Uuid, update: &AuditUpdate) -> Result<WebsiteAudit, StoreError> {
        let changes = Changes::new()
            .set_opt("status", update.status)
            .patch_json("report", update.report.as_ref().map(Option::as_ref))?
            .patch_json("crawl_data", update.crawl_data.as_ref().map(Option::as_ref))?
            .set_opt("error_message", update.error_message.as_ref())
            .set("updated_at", Utc::now());
        self.db.update(TABLE, &by_id(id), &changes, id)
    }

    /// Remove an audit, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.db.delete(TABLE, &by_id(id))? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::fixtures::db;
    use crate::{NewTenant, Tenants};
    use rstest::rstest;
    use serde_json::json;

    fn tenant_id(db: &Database) -> Uuid {
        Tenants::new(db)
            .create(&NewTenant {
                name: "Karoo Cycles".into(),
                slug: "karoo".into(),
                owner_email: "owner@karoo.co.za".into(),
                ..NewTenant::default()
            })
            .expect("create tenant")
            .id
    }

    fn report() -> AuditReport {
        AuditReport {
            brand_summary: "Family bike shop".into(),
            market_positioning: "Premium rentals".into(),
            ad_readiness_score: 72.0,
            recommendations: vec!["Add booking form".into()],
            competitor_signals: vec![CompetitorSignal {
                name: "Cape Cycles".into(),
                website: None,
                notes: "Cheaper day rates".into(),
            }],
            sections: vec![AuditSection {
                title: "SEO".into(),
                content: "Missing meta descriptions".into(),
                score: Some(40.0),
            }],
        }
    }

    #[rstest]
    fn audit_progresses_to_a_report(db: Database) {
        let audits = Audits::new(&db);
        let created = audits
            .create(&NewAudit {
                tenant_id: tenant_id(&db),
                url: "https://karoo.example".into(),
                ..NewAudit::default()
            })
            .expect("create");
        assert_eq!(created.status, AuditStatus::Pending);

        let crawled = audits
            .update(
                created.id,
                &AuditUpdate {
                    status: Some(AuditStatus::Analyzing),
                    crawl_data: Some(Some(json!({"pages": 12}))),
                    ..AuditUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(crawled.crawl_data, Some(json!({"pages": 12})));

        let complete = audits
            .update(
                created.id,
                &AuditUpdate {
                    status: Some(AuditStatus::Complete),
                    report: Some(Some(report())),
                    ..AuditUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(complete.report, Some(report()));
        assert_eq!(audits.get(created.id).expect("get").report, Some(report()));
    }

    #[rstest]
    fn latest_picks_the_newest(db: Database) {
        let audits = Audits::new(&db);
        let tenant = tenant_id(&db);
        assert_eq!(audits.latest(tenant).expect("latest"), None);

        let audit = |url: &str| NewAudit {
            tenant_id: tenant,
            url: url.into(),
            ..NewAudit::default()
        };
        audits.create(&audit("https://old.example")).expect("create");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let newest = audits.create(&audit("https://new.example")).expect("create");

        assert_eq!(audits.latest(tenant).expect("latest"), Some(newest.clone()));
        let urls: Vec<_> = audits
            .list(tenant)
            .expect("list")
            .into_iter()
            .map(|a| a.url)
            .collect();
        assert_eq!(urls, vec!["https://new.example", "https://old.example"]);
        assert!(audits.delete(newest.id).expect("delete"));
    }

    #[rstest]
    fn report_json_omits_missing_optionals() {
        let json = serde_json::to_value(report()).expect("serialise");
        assert!(json["competitor_signals"][0].get("website").is_none());
        assert_eq!(json["sections"][0]["score"], 40.0);
    }
}
