//! Competitors a tenant tracks, with their latest ad analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::by_id;
use crate::row::{FromRow, RowReader};
use crate::value::text_enum;
use crate::{Changes, Database, Direction, Filter, Select, StoreError};

const TABLE: &str = "competitors";

text_enum! {
    /// How a competitor came to be tracked.
    #[derive(Default)]
    pub enum CompetitorDiscovery {
        /// Added by a person.
        #[default]
        Manual = "manual",
        /// Spotted during a website audit.
        AiAudit = "ai_audit",
        /// Found in a public ad library.
        AdLibrary = "ad_library",
    }
}

/// How a competitor advertises. Stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    /// How the competitor presents itself.
    pub brand_positioning: String,
    /// Who its ads are aimed at.
    pub target_audience: String,
    /// Recurring themes in its copy.
    pub messaging_strategy: String,
    /// Networks the competitor is seen advertising on.
    pub platform_presence: Vec<String>,
    /// Formats and offers that keep reappearing.
    pub ad_patterns: Vec<String>,
    /// What it does well.
    pub strengths: Vec<String>,
    /// Where it falls short.
    pub weaknesses: Vec<String>,
    /// Ways the tenant could stand apart.
    pub differentiation_tips: Vec<String>,
}

/// A tracked competitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    /// Row identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Competitor name.
    pub name: String,
    /// Competitor website.
    pub website: Option<String>,
    /// Industry label.
    pub industry: Option<String>,
    /// How the competitor was found.
    pub discovered_via: CompetitorDiscovery,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Latest analysis.
    pub ad_analysis: Option<CompetitorAnalysis>,
    /// When `ad_analysis` was produced.
    pub last_analyzed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Competitor {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            tenant_id: row.uuid("tenant_id")?,
            name: row.text("name")?,
            website: row.opt_text("website")?,
            industry: row.opt_text("industry")?,
            discovered_via: row.parse("discovered_via")?,
            notes: row.opt_text("notes")?,
            ad_analysis: row.opt_json("ad_analysis")?,
            last_analyzed_at: row.opt_timestamp("last_analyzed_at")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Fields for [`Competitors::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCompetitor {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Competitor name.
    pub name: String,
    /// Competitor website.
    pub website: Option<String>,
    /// Industry label.
    pub industry: Option<String>,
    /// How the competitor was found.
    pub discovered_via: CompetitorDiscovery,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Analysis, when one is already available.
    pub ad_analysis: Option<CompetitorAnalysis>,
    /// When `ad_analysis` was produced.
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

/// Partial update; `Some(None)` clears a nullable column.
///
/// How a competitor was discovered never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompetitorUpdate {
    /// New name.
    pub name: Option<String>,
    /// New or cleared website.
    pub website: Option<Option<String>>,
    /// New or cleared industry.
    pub industry: Option<Option<String>>,
    /// New or cleared notes.
    pub notes: Option<Option<String>>,
    /// New or cleared analysis.
    pub ad_analysis: Option<Option<CompetitorAnalysis>>,
    /// New or cleared analysis time.
    pub last_analyzed_at: Option<Option<DateTime<Utc>>>,
}

/// Facade over the `competitors` table.
#[derive(Debug, Clone, Copy)]
pub struct Competitors<'db> {
    db: &'db Database,
}

impl<'db> Competitors<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// A tenant's competitors, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self, tenant_id: Uuid) -> Result<Vec<Competitor>, StoreError> {
        let select = Select::from(TABLE)
            .filter(Filter::new().eq("tenant_id", tenant_id))
            .order_by("created_at", Direction::Descending);
        self.db.fetch(&select)
    }

    /// Fetch one competitor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no competitor has `id`.
    pub fn get(&self, id: Uuid) -> Result<Competitor, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Start tracking a competitor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the analysis cannot be encoded or the
    /// insert fails.
    pub fn create(&self, competitor: &NewCompetitor) -> Result<Competitor, StoreError> {
        let now = Utc::now();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("tenant_id", competitor.tenant_id)
            .set("name", &competitor.name)
            .set("website", &competitor.website)
            .set("industry", &competitor.industry)
            .set("discovered_via", competitor.discovered_via)
            .set("notes", &competitor.notes)
            .set_json_or_null("ad_analysis", competitor.ad_analysis.as_ref())?
            .set("last_analyzed_at", competitor.last_analyzed_at)
            .set("created_at", now)
            .set("updated_at", now);
        self.db.insert(TABLE, &changes)
    }

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no competitor has `id`.
    pub fn update(&self, id: Uuid, update: &CompetitorUpdate) -> Result<Competitor, StoreError> {
        let changes = Changes::new()
            .set_opt("name", update.name.as_ref())
            .set_opt("website", update.website.as_ref())
            .set_opt("industry", update.industry.as_ref())
            .set_opt("notes", update.notes.as_ref())
            .patch_json("ad_analysis", update.ad_analysis.as_ref().map(Option::as_ref))?
            .set_opt("last_analyzed_at", update.last_analyzed_at)
            .set("updated_at", Utc::now());
        self.db.update(TABLE, &by_id(id), &changes, id)
    }

    /// Stop tracking a competitor, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.db.delete(TABLE, &by_id(id))? > 0)
    }
}
