//! Customers, optionally promoted from a lead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{by_id, leads, window};
use crate::row::{FromRow, RowReader};
use crate::value::text_enum;
use crate::{Changes, Database, Direction, Filter, Lead, Page, Select, StoreError};

const TABLE: &str = "customers";

text_enum! {
    /// Relationship stage of a customer.
    #[derive(Default)]
    pub enum CustomerStatus {
        /// Paying customer.
        Active = "active",
        /// Former customer.
        Inactive = "inactive",
        /// Not yet converted.
        #[default]
        Prospect = "prospect",
    }
}

/// Stored customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Row identifier.
    pub id: Uuid,
    /// Lead this customer was promoted from, if any.
    pub lead_id: Option<Uuid>,
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Business the contact works for.
    pub company: Option<String>,
    /// Relationship state.
    pub status: CustomerStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Customer {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            lead_id: row.opt_uuid("lead_id")?,
            name: row.text("name")?,
            email: row.text("email")?,
            phone: row.opt_text("phone")?,
            company: row.opt_text("company")?,
            status: row.parse("status")?,
            notes: row.opt_text("notes")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Fields for [`Customers::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCustomer {
    /// Lead this customer was promoted from, if any.
    pub lead_id: Option<Uuid>,
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Business the contact works for.
    pub company: Option<String>,
    /// Relationship state.
    pub status: CustomerStatus,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Partial update; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerUpdate {
    /// Contact name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<Option<String>>,
    /// Business the contact works for.
    pub company: Option<Option<String>>,
    /// Relationship state.
    pub status: Option<CustomerStatus>,
    /// Free-form notes.
    pub notes: Option<Option<String>>,
}

/// Values that take precedence over the lead's own when promoting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerOverrides {
    /// Contact name.
    pub name: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Business the contact works for.
    pub company: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Filters for [`Customers::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Present: exact status match.
    pub status: Option<CustomerStatus>,
    /// Present: case-insensitive substring of email, name or company.
    pub search: Option<String>,
    /// Present: page size. Absent: every row, or twenty when `offset` is set.
    pub limit: Option<u64>,
    /// Present: rows to skip.
    pub offset: Option<u64>,
}

/// Facade over the `customers` table.
#[derive(Debug, Clone, Copy)]
pub struct Customers<'db> {
    db: &'db Database,
}

impl<'db> Customers<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Newest customers first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self, filter: &CustomerFilter) -> Result<Page<Customer>, StoreError> {
        let mut predicates = Filter::new().eq_opt("status", filter.status);
        if let Some(search) = &filter.search {
            predicates = predicates.ilike_any(&["email", "name", "company"], search);
        }
        let select = Select::from(TABLE)
            .filter(predicates)
            .order_by("created_at", Direction::Descending);
        self.db.page(&window(select, filter.limit, filter.offset))
    }

    /// Fetch one customer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the query fails.
    pub fn get(&self, id: Uuid) -> Result<Customer, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Insert a customer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn create(&self, customer: &NewCustomer) -> Result<Customer, StoreError> {
        let now = Utc::now();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("lead_id", customer.lead_id)
            .set("name", &customer.name)
            .set("email", &customer.email)
            .set("phone", &customer.phone)
            .set("company", &customer.company)
            .set("status", customer.status)
            .set("notes", &customer.notes)
            .set("created_at", now)
            .set("updated_at", now);
        self.db.insert(TABLE, &changes)
    }

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the write fails.
    pub fn update(&self, id: Uuid, update: &CustomerUpdate) -> Result<Customer, StoreError> {
        let changes = Changes::new()
            .set_opt("name", update.name.as_ref())
            .set_opt("email", update.email.as_ref())
            .set_opt("phone", update.phone.as_ref())
            .set_opt("company", update.company.as_ref())
            .set_opt("status", update.status)
            .set_opt("notes", update.notes.as_ref())
            .set("updated_at", Utc::now());
        self.db.update(TABLE, &by_id(id), &changes, id)
    }

    /// Create a prospect from an existing lead.
    ///
    /// The name falls back to the lead's name, then its email. The phone
    /// falls back to the lead's phone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for the `leads` table when the lead
    /// does not exist.
    pub fn promote_from_lead(
        &self,
        lead_id: Uuid,
        overrides: CustomerOverrides,
    ) -> Result<Customer, StoreError> {
        let lead: Lead = self
            .db
            .fetch_one(&Select::from(leads::TABLE).filter(by_id(lead_id)), lead_id)?;
        let name = overrides
            .name
            .or_else(|| lead.name.clone())
            .unwrap_or_else(|| lead.email.clone());
        self.create(&NewCustomer {
            lead_id: Some(lead.id),
            name,
            email: lead.email,
            phone: overrides.phone.or(lead.phone),
            company: overrides.company,
            status: CustomerStatus::Prospect,
            notes: overrides.notes,
        })
    }

    /// Remove a customer, reporting whether it existed.
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
    use crate::{Leads, NewLead};
    use rstest::rstest;

    fn customer(name: &str, email: &str, company: Option<&str>) -> NewCustomer {
        NewCustomer {
            name: name.into(),
            email: email.into(),
            company: company.map(Into::into),
            ..NewCustomer::default()
        }
    }

    #[rstest]
    fn new_customers_default_to_prospect(db: Database) {
        let created = Customers::new(&db)
            .create(&customer("Lerato", "lerato@example.com", None))
            .expect("create");
        assert_eq!(created.status, CustomerStatus::Prospect);
        assert_eq!(created.lead_id, None);
    }

    #[rstest]
    #[case::status(CustomerFilter { status: Some(CustomerStatus::Active), ..CustomerFilter::default() }, &["Bongani"])]
    #[case::company(CustomerFilter { search: Some("umoya".into()), ..CustomerFilter::default() }, &["Lerato"])]
    #[case::email(CustomerFilter { search: Some("BONGANI@".into()), ..CustomerFilter::default() }, &["Bongani"])]
    fn list_filters(db: Database, #[case] filter: CustomerFilter, #[case] expected: &[&str]) {
        let customers = Customers::new(&db);
        customers
            .create(&customer("Lerato", "lerato@example.com", Some("Umoya Foods")))
            .expect("create");
        customers
            .create(&NewCustomer {
                status: CustomerStatus::Active,
                ..customer("Bongani", "bongani@example.com", None)
            })
            .expect("create");
        let page = customers.list(&filter).expect("list");
        let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[rstest]
    fn update_clears_and_sets(db: Database) {
        let customers = Customers::new(&db);
        let created = customers
            .create(&customer("Lerato", "lerato@example.com", Some("Umoya Foods")))
            .expect("create");
        let updated = customers
            .update(
                created.id,
                &CustomerUpdate {
                    company: Some(None),
                    status: Some(CustomerStatus::Inactive),
                    ..CustomerUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(updated.company, None);
        assert_eq!(updated.status, CustomerStatus::Inactive);
        assert_eq!(updated.name, "Lerato");
    }

    #[rstest]
    #[case::lead_name(Some("Naledi"), CustomerOverrides::default(), "Naledi")]
    #[case::lead_email(None, CustomerOverrides::default(), "naledi@example.com")]
    #[case::override_name(Some("Naledi"), CustomerOverrides { name: Some("N. Dube".into()), ..CustomerOverrides::default() }, "N. Dube")]
    fn promotion_picks_a_name(
        db: Database,
        #[case] lead_name: Option<&str>,
        #[case] overrides: CustomerOverrides,
        #[case] expected: &str,
    ) {
        let lead_id = Leads::new(&db)
            .create(&NewLead {
                email: "naledi@example.com".into(),
                source: "contact".into(),
                name: lead_name.map(Into::into),
                phone: Some("082 000 0000".into()),
                data: None,
            })
            .expect("create lead");
        let promoted = Customers::new(&db)
            .promote_from_lead(lead_id, overrides)
            .expect("promote");
        assert_eq!(promoted.name, expected);
        assert_eq!(promoted.email, "naledi@example.com");
        assert_eq!(promoted.phone.as_deref(), Some("082 000 0000"));
        assert_eq!(promoted.lead_id, Some(lead_id));
        assert_eq!(promoted.status, CustomerStatus::Prospect);
    }

    #[rstest]
    fn promoting_a_missing_lead_is_not_found(db: Database) {
        let err = Customers::new(&db)
            .promote_from_lead(Uuid::new_v4(), CustomerOverrides::default())
            .expect_err("missing lead");
        assert!(matches!(err, StoreError::NotFound { table: "leads", .. }));
    }

    #[rstest]
    fn deleting_a_lead_detaches_its_customer(db: Database) {
        let leads = Leads::new(&db);
        let lead_id = leads
            .create(&NewLead {
                email: "naledi@example.com".into(),
                source: "contact".into(),
                ..NewLead::default()
            })
            .expect("create lead");
        let customers = Customers::new(&db);
        let promoted = customers
            .promote_from_lead(lead_id, CustomerOverrides::default())
            .expect("promote");
        assert!(leads.delete(lead_id).expect("delete lead"));
        assert_eq!(customers.get(promoted.id).expect("get").lead_id, None);
    }
}
