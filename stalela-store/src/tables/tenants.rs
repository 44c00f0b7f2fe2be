//! Tenants of the marketing product and their members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use super::{DEFAULT_PAGE_LIMIT, by_id, window};
use crate::row::{FromRow, RowReader};
use crate::value::text_enum;
use crate::{Changes, Database, Direction, Filter, Page, Select, StoreError};

pub(super) const TABLE: &str = "tenants";
const USERS: &str = "tenant_users";

text_enum! {
    /// Billing plan.
    #[derive(Default)]
    pub enum TenantPlan {
        /// No paid features.
        #[default]
        Free = "free",
        /// Paid self-serve plan.
        Premium = "premium",
        /// Contracted plan.
        Enterprise = "enterprise",
    }
}

text_enum! {
    /// Account standing.
    #[derive(Default)]
    pub enum TenantStatus {
        /// In good standing.
        Active = "active",
        /// Access revoked.
        Suspended = "suspended",
        /// Evaluating the product.
        #[default]
        Trial = "trial",
    }
}

text_enum! {
    /// Furthest onboarding step reached.
    #[derive(Default)]
    pub enum OnboardingStatus {
        /// Nothing configured yet.
        #[default]
        Pending = "pending",
        /// Website captured.
        Website = "website",
        /// Ad platforms being connected.
        Platforms = "platforms",
        /// Ready to run campaigns.
        Complete = "complete",
    }
}

text_enum! {
    /// Permission level of a member within a tenant.
    #[derive(Default)]
    pub enum TenantRole {
        /// Full control, including billing.
        Owner = "owner",
        /// Manages members and campaigns.
        Admin = "admin",
        /// Works on campaigns.
        #[default]
        Member = "member",
        /// Read-only access.
        Viewer = "viewer",
    }
}

/// Stored tenant account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// Row identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// URL slug, unique across tenants.
    pub slug: String,
    /// Email of the account owner.
    pub owner_email: String,
    /// Billing plan.
    pub plan: TenantPlan,
    /// Account standing.
    pub status: TenantStatus,
    /// Progress through onboarding.
    pub onboarding_status: OnboardingStatus,
    /// Tenant website.
    pub website_url: Option<String>,
    /// Free-form settings document.
    pub settings: Option<Json>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Tenant {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            name: row.text("name")?,
            slug: row.text("slug")?,
            owner_email: row.text("owner_email")?,
            plan: row.parse("plan")?,
            status: row.parse("status")?,
            onboarding_status: row.parse("onboarding_status")?,
            website_url: row.opt_text("website_url")?,
            settings: row.opt_json("settings")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Fields for [`Tenants::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTenant {
    /// Display name.
    pub name: String,
    /// URL slug, unique across tenants.
    pub slug: String,
    /// Email of the account owner.
    pub owner_email: String,
    /// Billing plan.
    pub plan: TenantPlan,
    /// Account standing.
    pub status: TenantStatus,
    /// Progress through onboarding.
    pub onboarding_status: OnboardingStatus,
    /// Tenant website.
    pub website_url: Option<String>,
    /// Free-form settings document.
    pub settings: Option<Json>,
}

/// Partial update; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantUpdate {
    /// Display name.
    pub name: Option<String>,
    /// URL slug, unique across tenants.
    pub slug: Option<String>,
    /// Email of the account owner.
    pub owner_email: Option<String>,
    /// Billing plan.
    pub plan: Option<TenantPlan>,
    /// Account standing.
    pub status: Option<TenantStatus>,
    /// Progress through onboarding.
    pub onboarding_status: Option<OnboardingStatus>,
    /// Tenant website.
    pub website_url: Option<Option<String>>,
    /// Free-form settings document.
    pub settings: Option<Option<Json>>,
}

/// Filters for [`Tenants::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantFilter {
    /// Present: case-insensitive substring of name or owner email.
    pub search: Option<String>,
    /// Page size, [`DEFAULT_PAGE_LIMIT`] when absent.
    pub limit: Option<u64>,
    /// Present: rows to skip.
    pub offset: Option<u64>,
}

/// Membership of an authenticated user in a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantUser {
    /// Row identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Identifier issued by the authentication provider.
    pub user_id: String,
    /// Permissions within the tenant.
    pub role: TenantRole,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FromRow for TenantUser {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            tenant_id: row.uuid("tenant_id")?,
            user_id: row.text("user_id")?,
            role: row.parse("role")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

/// Fields for [`Tenants::add_user`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTenantUser {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Identifier issued by the authentication provider.
    pub user_id: String,
    /// Permissions within the tenant.
    pub role: TenantRole,
}

/// A membership together with the tenant it grants access to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantMembership {
    /// The membership row.
    #[serde(flatten)]
    pub membership: TenantUser,
    /// The tenant it grants access to.
    pub tenant: Tenant,
}

/// Facade over the `tenants` and `tenant_users` tables.
#[derive(Debug, Clone, Copy)]
pub struct Tenants<'db> {
    db: &'db Database,
}

impl<'db> Tenants<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Insert a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the slug is taken or the insert
    /// fails.
    pub fn create(&self, tenant: &NewTenant) -> Result<Tenant, StoreError> {
        let now = Utc::now();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("name", &tenant.name)
            .set("slug", &tenant.slug)
            .set("owner_email", &tenant.owner_email)
            .set("plan", tenant.plan)
            .set("status", tenant.status)
            .set("onboarding_status", tenant.onboarding_status)
            .set("website_url", &tenant.website_url)
            .set_json_or_null("settings", tenant.settings.as_ref())?
            .set("created_at", now)
            .set("updated_at", now);
        self.db.insert(TABLE, &changes)
    }

    /// Fetch one tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the query fails.
    pub fn get(&self, id: Uuid) -> Result<Tenant, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Tenant with `slug`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        self.db
            .fetch_optional(&Select::from(TABLE).filter(Filter::new().eq("slug", slug)))
    }

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the write fails.
    pub fn update(&self, id: Uuid, update: &TenantUpdate) -> Result<Tenant, StoreError> {
        let changes = Changes::new()
            .set_opt("name", update.name.as_ref())
            .set_opt("slug", update.slug.as_ref())
            .set_opt("owner_email", update.owner_email.as_ref())
            .set_opt("plan", update.plan)
            .set_opt("status", update.status)
            .set_opt("onboarding_status", update.onboarding_status)
            .set_opt("website_url", update.website_url.as_ref())
            .patch_json("settings", update.settings.as_ref().map(Option::as_ref))?
            .set("updated_at", Utc::now());
        self.db.update(TABLE, &by_id(id), &changes, id)
    }

    /// Newest tenants first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self, filter: &TenantFilter) -> Result<Page<Tenant>, StoreError> {
        let mut predicates = Filter::new();
        if let Some(search) = &filter.search {
            predicates = predicates.ilike_any(&["name", "owner_email"], search);
        }
        let select = Select::from(TABLE)
            .filter(predicates)
            .order_by("created_at", Direction::Descending);
        let select = window(
            select,
            Some(filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT)),
            filter.offset,
        );
        self.db.page(&select)
    }

    /// Remove a tenant together with its members, campaigns and audits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.db.delete(TABLE, &by_id(id))? > 0)
    }

    /// Grant `user.user_id` a role in a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the user already belongs to the
    /// tenant or the insert fails.
    pub fn add_user(&self, user: &NewTenantUser) -> Result<TenantUser, StoreError> {
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("tenant_id", user.tenant_id)
            .set("user_id", &user.user_id)
            .set("role", user.role)
            .set("created_at", Utc::now());
        self.db.insert(USERS, &changes)
    }

    /// Members of a tenant, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list_users(&self, tenant_id: Uuid) -> Result<Vec<TenantUser>, StoreError> {
        let select = Select::from(USERS)
            .filter(Filter::new().eq("tenant_id", tenant_id))
            .order_by("created_at", Direction::Ascending);
        self.db.fetch(&select)
    }

    /// Revoke a membership. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn remove_user(&self, tenant_id: Uuid, user_id: &str) -> Result<bool, StoreError> {
        let filter = Filter::new()
            .eq("tenant_id", tenant_id)
            .eq("user_id", user_id);
        Ok(self.db.delete(USERS, &filter)? > 0)
    }

    /// Every tenant `user_id` belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn tenants_for_user(&self, user_id: &str) -> Result<Vec<TenantMembership>, StoreError> {
        let memberships: Vec<TenantUser> = self
            .db
            .fetch(&Select::from(USERS).filter(Filter::new().eq("user_id", user_id)))?;
        memberships
            .into_iter()
            .map(|membership| {
                let tenant = self.get(membership.tenant_id)?;
                Ok(TenantMembership { membership, tenant })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::fixtures::db;
    use rstest::rstest;
    use serde_json::json;

    fn tenant(name: &str, slug: &str) -> NewTenant {
        NewTenant {
            name: name.into(),
            slug: slug.into(),
            owner_email: format!("owner@{slug}.co.za"),
            ..NewTenant::default()
        }
    }

    #[rstest]
    fn create_applies_defaults(db: Database) {
        let created = Tenants::new(&db)
            .create(&tenant("Umoya Foods", "umoya"))
            .expect("create");
        assert_eq!(created.plan, TenantPlan::Free);
        assert_eq!(created.status, TenantStatus::Trial);
        assert_eq!(created.onboarding_status, OnboardingStatus::Pending);
    }

    #[rstest]
    fn slug_lookups_are_optional(db: Database) {
        let tenants = Tenants::new(&db);
        let created = tenants.create(&tenant("Umoya Foods", "umoya")).expect("create");
        assert_eq!(tenants.get_by_slug("umoya").expect("lookup"), Some(created));
        assert_eq!(tenants.get_by_slug("missing").expect("lookup"), None);
    }

    #[rstest]
    fn duplicate_slugs_are_rejected(db: Database) {
        let tenants = Tenants::new(&db);
        tenants.create(&tenant("Umoya Foods", "umoya")).expect("create");
        let err = tenants
            .create(&tenant("Umoya Again", "umoya"))
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::Query { table: "tenants", .. }));
    }

    #[rstest]
    fn update_patches_settings(db: Database) {
        let tenants = Tenants::new(&db);
        let created = tenants
            .create(&NewTenant {
                settings: Some(json!({"theme": "dark"})),
                ..tenant("Umoya Foods", "umoya")
            })
            .expect("create");
        let upgraded = tenants
            .update(
                created.id,
                &TenantUpdate {
                    plan: Some(TenantPlan::Premium),
                    ..TenantUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(upgraded.plan, TenantPlan::Premium);
        assert_eq!(upgraded.settings, Some(json!({"theme": "dark"})));

        let cleared = tenants
            .update(
                created.id,
                &TenantUpdate {
                    settings: Some(None),
                    ..TenantUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(cleared.settings, None);
    }

    #[rstest]
    fn list_searches_name_and_owner(db: Database) {
        let tenants = Tenants::new(&db);
        tenants.create(&tenant("Umoya Foods", "umoya")).expect("create");
        tenants.create(&tenant("Karoo Cycles", "karoo")).expect("create");
        let filter = TenantFilter {
            search: Some("KAROO.co".into()),
            ..TenantFilter::default()
        };
        let page = tenants.list(&filter).expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "karoo");
        assert_eq!(tenants.list(&TenantFilter::default()).expect("list").total, 2);
    }

    #[rstest]
    fn membership_round_trip(db: Database) {
        let tenants = Tenants::new(&db);
        let umoya = tenants.create(&tenant("Umoya Foods", "umoya")).expect("create");
        let karoo = tenants.create(&tenant("Karoo Cycles", "karoo")).expect("create");
        for (tenant_id, role) in [(umoya.id, TenantRole::Owner), (karoo.id, TenantRole::Viewer)] {
            tenants
                .add_user(&NewTenantUser {
                    tenant_id,
                    user_id: "user-1".into(),
                    role,
                })
                .expect("add user");
        }

        let memberships = tenants.tenants_for_user("user-1").expect("tenants");
        assert_eq!(memberships.len(), 2);
        assert!(memberships.iter().any(|m| m.tenant.slug == "karoo"
            && m.membership.role == TenantRole::Viewer));

        assert!(tenants.remove_user(umoya.id, "user-1").expect("remove"));
        assert!(!tenants.remove_user(umoya.id, "user-1").expect("remove again"));
        assert!(tenants.list_users(umoya.id).expect("users").is_empty());
    }

    #[rstest]
    fn deleting_a_tenant_removes_its_members(db: Database) {
        let tenants = Tenants::new(&db);
        let umoya = tenants.create(&tenant("Umoya Foods", "umoya")).expect("create");
        tenants
            .add_user(&NewTenantUser {
                tenant_id: umoya.id,
                user_id: "user-1".into(),
                role: TenantRole::Member,
            })
            .expect("add user");
        assert!(tenants.delete(umoya.id).expect("delete"));
        assert!(tenants.tenants_for_user("user-1").expect("tenants").is_empty());
    }
}
