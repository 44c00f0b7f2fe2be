//! Prospects suggested for a tenant, ranked by relevance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DEFAULT_PAGE_LIMIT, by_id, window};
use crate::row::{FromRow, RowReader};
use crate::value::text_enum;
use crate::{Changes, Database, Direction, Filter, Page, Select, StoreError};

const TABLE: &str = "generated_leads";

text_enum! {
    /// Follow-up state of a suggested prospect.
    #[derive(Default)]
    pub enum GeneratedLeadStatus {
        /// Not looked at yet.
        #[default]
        New = "new",
        /// Reached out to.
        Contacted = "contacted",
        /// Worth pursuing.
        Qualified = "qualified",
        /// Not a fit.
        Dismissed = "dismissed",
    }
}

/// A suggested prospect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLead {
    /// Row identifier.
    pub id: Uuid,
    /// Tenant the prospect was suggested to.
    pub tenant_id: Uuid,
    /// Directory company, when the prospect came from one.
    pub company_id: Option<Uuid>,
    /// Business name.
    pub company_name: String,
    /// Person to approach.
    pub contact_name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Business website.
    pub website: Option<String>,
    /// Why the prospect was suggested.
    pub reason: Option<String>,
    /// Higher is a better fit.
    pub relevance_score: f64,
    /// Follow-up state.
    pub status: GeneratedLeadStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for GeneratedLead {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            tenant_id: row.uuid("tenant_id")?,
            company_id: row.opt_uuid("company_id")?,
            company_name: row.text("company_name")?,
            contact_name: row.opt_text("contact_name")?,
            email: row.opt_text("email")?,
            phone: row.opt_text("phone")?,
            website: row.opt_text("website")?,
            reason: row.opt_text("reason")?,
            relevance_score: row.real("relevance_score")?,
            status: row.parse("status")?,
            notes: row.opt_text("notes")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Fields for [`LeadGen::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewGeneratedLead {
    /// Tenant the prospect is suggested to.
    pub tenant_id: Uuid,
    /// Directory company, when the prospect came from one.
    pub company_id: Option<Uuid>,
    /// Business name.
    pub company_name: String,
    /// Person to approach.
    pub contact_name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Business website.
    pub website: Option<String>,
    /// Why the prospect was suggested.
    pub reason: Option<String>,
    /// Higher is a better fit.
    pub relevance_score: f64,
}

impl NewGeneratedLead {
    fn changes(&self, now: DateTime<Utc>) -> Changes {
        Changes::new()
            .set("id", Uuid::new_v4())
            .set("tenant_id", self.tenant_id)
            .set("company_id", self.company_id)
            .set("company_name", &self.company_name)
            .set("contact_name", &self.contact_name)
            .set("email", &self.email)
            .set("phone", &self.phone)
            .set("website", &self.website)
            .set("reason", &self.reason)
            .set("relevance_score", self.relevance_score)
            .set("status", GeneratedLeadStatus::New)
            .set("created_at", now)
            .set("updated_at", now)
    }
}

/// Partial update; `Some(None)` clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedLeadUpdate {
    /// New follow-up state.
    pub status: Option<GeneratedLeadStatus>,
    /// New or cleared notes.
    pub notes: Option<Option<String>>,
}

/// Filters for [`LeadGen::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratedLeadFilter {
    /// Present: exact status match.
    pub status: Option<GeneratedLeadStatus>,
    /// Page size, [`DEFAULT_PAGE_LIMIT`] when absent.
    pub limit: Option<u64>,
    /// Present: rows to skip.
    pub offset: Option<u64>,
}

/// Facade over the `generated_leads` table.
#[derive(Debug, Clone, Copy)]
pub struct LeadGen<'db> {
    db: &'db Database,
}

impl<'db> LeadGen<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// A tenant's prospects, most relevant first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(
        &self,
        tenant_id: Uuid,
        filter: &GeneratedLeadFilter,
    ) -> Result<Page<GeneratedLead>, StoreError> {
        let select = Select::from(TABLE)
            .filter(
                Filter::new()
                    .eq("tenant_id", tenant_id)
                    .eq_opt("status", filter.status),
            )
            .order_by("relevance_score", Direction::Descending);
        let select = window(
            select,
            Some(filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT)),
            filter.offset,
        );
        self.db.page(&select)
    }

    /// Fetch one prospect.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no prospect has `id`.
    pub fn get(&self, id: Uuid) -> Result<GeneratedLead, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Record one prospect with status `new`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the tenant does not exist or the insert
    /// fails.
    pub fn create(&self, lead: &NewGeneratedLead) -> Result<GeneratedLead, StoreError> {
        self.db.insert(TABLE, &lead.changes(Utc::now()))
    }

    /// Record every prospect or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when any row fails; nothing is written then.
    pub fn create_batch(
        &self,
        leads: &[NewGeneratedLead],
    ) -> Result<Vec<GeneratedLead>, StoreError> {
        let now = Utc::now();
        let rows: Vec<Changes> = leads.iter().map(|lead| lead.changes(now)).collect();
        self.db.insert_many(TABLE, &rows)
    }

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no prospect has `id`.
    pub fn update(
        &self,
        id: Uuid,
        update: &GeneratedLeadUpdate,
    ) -> Result<GeneratedLead, StoreError> {
        let changes = Changes::new()
            .set_opt("status", update.status)
            .set_opt("notes", update.notes.as_ref())
            .set("updated_at", Utc::now());
        self.db.update(TABLE, &by_id(id), &changes, id)
    }

    /// Remove a prospect, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.db.delete(TABLE, &by_id(id))? > 0)
    }
}
