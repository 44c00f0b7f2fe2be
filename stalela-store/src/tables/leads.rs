//! Contact-form and download leads captured by the marketing site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use super::{by_id, window};
use crate::row::{FromRow, RowReader};
use crate::{Changes, Database, Direction, Filter, Page, Select, StoreError};

pub(super) const TABLE: &str = "leads";

/// A captured lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Row identifier.
    pub id: Uuid,
    /// Contact email.
    pub email: String,
    /// Where the lead came from, such as `contact_form`.
    pub source: String,
    /// Contact name.
    pub name: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Form payload as submitted.
    pub data: Option<Json>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FromRow for Lead {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            email: row.text("email")?,
            source: row.text("source")?,
            name: row.opt_text("name")?,
            phone: row.opt_text("phone")?,
            data: row.opt_json("data")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

/// Fields for a new lead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    /// Contact email.
    pub email: String,
    /// Where the lead came from, such as `contact_form`.
    pub source: String,
    /// Contact name.
    pub name: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Form payload as submitted.
    pub data: Option<Json>,
}

/// Filters for [`Leads::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    /// Present: exact source match.
    pub source: Option<String>,
    /// Present: case-insensitive substring of email or name.
    pub search: Option<String>,
    /// Present: only leads created at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Present: only leads created at or before this instant.
    pub to: Option<DateTime<Utc>>,
    /// Present: page size. Absent: every row, or twenty when `offset` is set.
    pub limit: Option<u64>,
    /// Present: rows to skip.
    pub offset: Option<u64>,
}

/// Facade over the `leads` table.
#[derive(Debug, Clone, Copy)]
pub struct Leads<'db> {
    db: &'db Database,
}

impl<'db> Leads<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Newest leads first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self, filter: &LeadFilter) -> Result<Page<Lead>, StoreError> {
        let mut predicates = Filter::new()
            .eq_opt("source", filter.source.as_deref())
            .gte_opt("created_at", filter.from)
            .lte_opt("created_at", filter.to);
        if let Some(search) = &filter.search {
            predicates = predicates.ilike_any(&["email", "name"], search);
        }
        let select = Select::from(TABLE)
            .filter(predicates)
            .order_by("created_at", Direction::Descending);
        self.db.page(&window(select, filter.limit, filter.offset))
    }

    /// Fetch one lead.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the query fails.
    pub fn get(&self, id: Uuid) -> Result<Lead, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Store a lead and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a value cannot be encoded or the
    /// write fails.
    pub fn create(&self, lead: &NewLead) -> Result<Uuid, StoreError> {
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("email", &lead.email)
            .set("source", &lead.source)
            .set("name", &lead.name)
            .set("phone", &lead.phone)
            .set_json_or_null("data", lead.data.as_ref())?
            .set("created_at", Utc::now());
        let stored: Lead = self.db.insert(TABLE, &changes)?;
        Ok(stored.id)
    }

    /// Distinct lead sources, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn sources(&self) -> Result<Vec<String>, StoreError> {
        let select = Select::from(TABLE)
            .columns(&["source"])
            .distinct()
            .order_by("source", Direction::Ascending);
        self.db.fetch(&select)
    }

    /// Remove a lead, reporting whether it existed.
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
    use chrono::Duration;
    use rstest::rstest;
    use serde_json::json;
    use std::thread;
    use std::time::Duration as StdDuration;

    fn lead(email: &str, source: &str, name: Option<&str>) -> NewLead {
        NewLead {
            email: email.into(),
            source: source.into(),
            name: name.map(Into::into),
            ..NewLead::default()
        }
    }

    fn seed(db: &Database) -> Vec<Uuid> {
        let leads = Leads::new(db);
        [
            lead("thandi@example.com", "contact", Some("Thandi")),
            lead("pieter@example.com", "download", None),
            lead("ayesha@example.com", "contact", Some("Ayesha")),
        ]
        .iter()
        .map(|new| {
            // Distinct creation instants keep the ordering deterministic.
            thread::sleep(StdDuration::from_millis(2));
            leads.create(new).expect("create lead")
        })
        .collect()
    }

    #[rstest]
    fn create_returns_a_readable_id(db: Database) {
        let leads = Leads::new(&db);
        let id = leads
            .create(&NewLead {
                data: Some(json!({"message": "Call me"})),
                ..lead("sipho@example.com", "contact", Some("Sipho"))
            })
            .expect("create");
        let stored = leads.get(id).expect("get");
        assert_eq!(stored.email, "sipho@example.com");
        assert_eq!(stored.data, Some(json!({"message": "Call me"})));
    }

    #[rstest]
    fn list_is_newest_first(db: Database) {
        let ids = seed(&db);
        let page = Leads::new(&db).list(&LeadFilter::default()).expect("list");
        let listed: Vec<_> = page.items.iter().map(|l| l.id).collect();
        assert_eq!(listed, ids.into_iter().rev().collect::<Vec<_>>());
        assert_eq!(page.total, 3);
    }

    #[rstest]
    #[case::by_source(LeadFilter { source: Some("contact".into()), ..LeadFilter::default() }, 2)]
    #[case::search_name(LeadFilter { search: Some("thandi".into()), ..LeadFilter::default() }, 1)]
    #[case::search_email(LeadFilter { search: Some("PIETER@".into()), ..LeadFilter::default() }, 1)]
    #[case::offset_only(LeadFilter { offset: Some(1), ..LeadFilter::default() }, 2)]
    #[case::limit(LeadFilter { limit: Some(1), ..LeadFilter::default() }, 1)]
    fn list_filters(db: Database, #[case] filter: LeadFilter, #[case] expected: usize) {
        seed(&db);
        let page = Leads::new(&db).list(&filter).expect("list");
        assert_eq!(page.items.len(), expected);
    }

    #[rstest]
    fn date_range_bounds_are_inclusive(db: Database) {
        let ids = seed(&db);
        let leads = Leads::new(&db);
        let middle = leads.get(ids[1]).expect("get").created_at;
        let filter = LeadFilter {
            from: Some(middle),
            to: Some(middle),
            ..LeadFilter::default()
        };
        let page = leads.list(&filter).expect("list");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, ids[1]);

        let future = LeadFilter {
            from: Some(Utc::now() + Duration::days(1)),
            ..LeadFilter::default()
        };
        assert_eq!(leads.list(&future).expect("list").total, 0);
    }

    #[rstest]
    fn sources_are_distinct_and_sorted(db: Database) {
        seed(&db);
        assert_eq!(
            Leads::new(&db).sources().expect("sources"),
            vec!["contact", "download"]
        );
    }

    #[rstest]
    fn delete_removes_the_lead(db: Database) {
        let ids = seed(&db);
        let leads = Leads::new(&db);
        assert!(leads.delete(ids[0]).expect("delete"));
        assert!(leads.get(ids[0]).expect_err("gone").is_not_found());
    }
}
