//! Advertising campaigns, their generated content and daily metrics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use super::{DEFAULT_PAGE_LIMIT, by_id, window};
use crate::row::{FromRow, RowReader};
use crate::value::text_enum;
use crate::{Changes, Database, Direction, Filter, Page, Select, StoreError};

const TABLE: &str = "campaigns";
const CONTENT: &str = "campaign_content";
const METRICS: &str = "campaign_metrics";

/// Currency recorded when a new campaign names none.
const DEFAULT_CURRENCY: &str = "ZAR";

text_enum! {
    /// Ad network a campaign runs on.
    #[derive(Default)]
    pub enum CampaignPlatform {
        /// Google Ads.
        Google = "google",
        /// Facebook and Instagram.
        Meta = "meta",
        /// LinkedIn.
        Linkedin = "linkedin",
        /// TikTok.
        Tiktok = "tiktok",
        /// X, formerly Twitter.
        X = "x",
        /// Not tied to one network.
        #[default]
        Generic = "generic",
    }
}

text_enum! {
    /// Lifecycle of a campaign.
    #[derive(Default)]
    pub enum CampaignStatus {
        /// Being prepared.
        #[default]
        Draft = "draft",
        /// Running.
        Active = "active",
        /// Temporarily stopped.
        Paused = "paused",
        /// Finished its run.
        Completed = "completed",
        /// Hidden from active views.
        Archived = "archived",
    }
}

text_enum! {
    /// Kind of generated creative.
    pub enum ContentType {
        /// Body text of an ad.
        AdCopy = "ad_copy",
        /// Short headline.
        Headline = "headline",
        /// Longer description line.
        Description = "description",
        /// Call to action.
        Cta = "cta",
        /// Prompt for generating an image.
        ImagePrompt = "image_prompt",
        /// Organic social post.
        SocialPost = "social_post",
    }
}

/// Stored campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Row identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Directory company the campaign is run for.
    pub client_company_id: Option<Uuid>,
    /// Campaign name.
    pub name: String,
    /// What the campaign should achieve.
    pub objective: Option<String>,
    /// Ad network.
    pub platform: CampaignPlatform,
    /// Lifecycle state.
    pub status: CampaignStatus,
    /// Total budget in `currency`.
    pub budget: Option<f64>,
    /// ISO 4217 currency code.
    pub currency: String,
    /// First day the campaign runs.
    pub start_date: Option<NaiveDate>,
    /// Last day the campaign runs.
    pub end_date: Option<NaiveDate>,
    /// Audience definition document.
    pub target_audience: Option<Json>,
    /// Platform-specific settings document.
    pub settings: Option<Json>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Campaign {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            tenant_id: row.uuid("tenant_id")?,
            client_company_id: row.opt_uuid("client_company_id")?,
            name: row.text("name")?,
            objective: row.opt_text("objective")?,
            platform: row.parse("platform")?,
            status: row.parse("status")?,
            budget: row.opt_real("budget")?,
            currency: row.text("currency")?,
            start_date: row.opt_date("start_date")?,
            end_date: row.opt_date("end_date")?,
            target_audience: row.opt_json("target_audience")?,
            settings: row.opt_json("settings")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Fields for [`Campaigns::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCampaign {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Directory company the campaign is run for.
    pub client_company_id: Option<Uuid>,
    /// Campaign name.
    pub name: String,
    /// What the campaign should achieve.
    pub objective: Option<String>,
    /// Ad network.
    pub platform: CampaignPlatform,
    /// Lifecycle state.
    pub status: CampaignStatus,
    /// Total budget in `currency`.
    pub budget: Option<f64>,
    /// `ZAR` when absent.
    pub currency: Option<String>,
    /// First day the campaign runs.
    pub start_date: Option<NaiveDate>,
    /// Last day the campaign runs.
    pub end_date: Option<NaiveDate>,
    /// Audience definition document.
    pub target_audience: Option<Json>,
    /// Platform-specific settings document.
    pub settings: Option<Json>,
}

/// Partial update; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignUpdate {
    /// Directory company the campaign is run for.
    pub client_company_id: Option<Option<Uuid>>,
    /// Campaign name.
    pub name: Option<String>,
    /// What the campaign should achieve.
    pub objective: Option<Option<String>>,
    /// Ad network.
    pub platform: Option<CampaignPlatform>,
    /// Lifecycle state.
    pub status: Option<CampaignStatus>,
    /// Total budget in `currency`.
    pub budget: Option<Option<f64>>,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
    /// First day the campaign runs.
    pub start_date: Option<Option<NaiveDate>>,
    /// Last day the campaign runs.
    pub end_date: Option<Option<NaiveDate>>,
    /// Audience definition document.
    pub target_audience: Option<Option<Json>>,
    /// Platform-specific settings document.
    pub settings: Option<Option<Json>>,
}

/// Filters for [`Campaigns::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignFilter {
    /// Present: exact status match.
    pub status: Option<CampaignStatus>,
    /// Present: exact platform match.
    pub platform: Option<CampaignPlatform>,
    /// Present: only campaigns run for this client.
    pub client_company_id: Option<Uuid>,
    /// Present: case-insensitive substring of name or objective.
    pub search: Option<String>,
    /// Page size, [`DEFAULT_PAGE_LIMIT`] when absent.
    pub limit: Option<u64>,
    /// Present: rows to skip.
    pub offset: Option<u64>,
}

/// Stored creative for a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignContent {
    /// Row identifier.
    pub id: Uuid,
    /// Owning campaign.
    pub campaign_id: Uuid,
    /// Kind of creative.
    pub content_type: ContentType,
    /// Creative text.
    pub content: String,
    /// A/B variant name such as `A`.
    pub variant_label: Option<String>,
    /// Whether a person signed the creative off.
    pub approved: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FromRow for CampaignContent {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            campaign_id: row.uuid("campaign_id")?,
            content_type: row.parse("content_type")?,
            content: row.text("content")?,
            variant_label: row.opt_text("variant_label")?,
            approved: row.flag("approved")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

/// Fields for [`Campaigns::create_content`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampaignContent {
    /// Owning campaign.
    pub campaign_id: Uuid,
    /// Kind of creative.
    pub content_type: ContentType,
    /// Creative text.
    pub content: String,
    /// A/B variant name such as `A`.
    pub variant_label: Option<String>,
    /// Whether a person signed the creative off.
    pub approved: bool,
}

impl NewCampaignContent {
    fn changes(&self, now: DateTime<Utc>) -> Changes {
        Changes::new()
            .set("id", Uuid::new_v4())
            .set("campaign_id", self.campaign_id)
            .set("content_type", self.content_type)
            .set("content", &self.content)
            .set("variant_label", &self.variant_label)
            .set("approved", self.approved)
            .set("created_at", now)
    }
}

/// One day of delivery figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    /// Row identifier.
    pub id: Uuid,
    /// Owning campaign.
    pub campaign_id: Uuid,
    /// Day the figures cover.
    pub date: NaiveDate,
    /// Times an ad was shown.
    pub impressions: i64,
    /// Clicks on an ad.
    pub clicks: i64,
    /// Goal completions attributed to the campaign.
    pub conversions: i64,
    /// Money spent in the campaign currency.
    pub spend: f64,
    /// Revenue attributed to the campaign.
    pub revenue: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FromRow for CampaignMetrics {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            campaign_id: row.uuid("campaign_id")?,
            date: row.date("date")?,
            impressions: row.int("impressions")?,
            clicks: row.int("clicks")?,
            conversions: row.int("conversions")?,
            spend: row.real("spend")?,
            revenue: row.real("revenue")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

/// Fields for [`Campaigns::record_metrics`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewCampaignMetrics {
    /// Owning campaign.
    pub campaign_id: Uuid,
    /// Day the figures cover.
    pub date: NaiveDate,
    /// Times an ad was shown.
    pub impressions: i64,
    /// Clicks on an ad.
    pub clicks: i64,
    /// Goal completions attributed to the campaign.
    pub conversions: i64,
    /// Money spent in the campaign currency.
    pub spend: f64,
    /// Revenue attributed to the campaign.
    pub revenue: f64,
}

impl NewCampaignMetrics {
    /// A day with every figure at zero.
    #[must_use]
    pub const fn new(campaign_id: Uuid, date: NaiveDate) -> Self {
        Self {
            campaign_id,
            date,
            impressions: 0,
            clicks: 0,
            conversions: 0,
            spend: 0.0,
            revenue: 0.0,
        }
    }
}

/// Lifetime totals for a campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Times an ad was shown.
    pub impressions: i64,
    /// Clicks on an ad.
    pub clicks: i64,
    /// Goal completions attributed to the campaign.
    pub conversions: i64,
    /// Money spent in the campaign currency.
    pub spend: f64,
    /// Revenue attributed to the campaign.
    pub revenue: f64,
    /// Days with recorded metrics.
    pub days: usize,
}

impl MetricsSummary {
    fn add(mut self, day: &CampaignMetrics) -> Self {
        self.impressions += day.impressions;
        self.clicks += day.clicks;
        self.conversions += day.conversions;
        self.spend += day.spend;
        self.revenue += day.revenue;
        self.days += 1;
        self
    }
}

/// Facade over the campaign tables.
#[derive(Debug, Clone, Copy)]
pub struct Campaigns<'db> {
    db: &'db Database,
}

impl<'db> Campaigns<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// A tenant's campaigns, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self, tenant_id: Uuid, filter: &CampaignFilter) -> Result<Page<Campaign>, StoreError> {
        let mut predicates = Filter::new()
            .eq("tenant_id", tenant_id)
            .eq_opt("status", filter.status)
            .eq_opt("platform", filter.platform)
            .eq_opt("client_company_id", filter.client_company_id);
        if let Some(search) = &filter.search {
            predicates = predicates.ilike_any(&["name", "objective"], search);
        }
        let select = Select::from(TABLE)
            .filter(predicates)
            .order_by("updated_at", Direction::Descending);
        let select = window(
            select,
            Some(filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT)),
            filter.offset,
        );
        self.db.page(&select)
    }

    /// Fetch one campaign.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the query fails.
    pub fn get(&self, id: Uuid) -> Result<Campaign, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Insert a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a value cannot be encoded or the
    /// write fails.
    pub fn create(&self, campaign: &NewCampaign) -> Result<Campaign, StoreError> {
        let now = Utc::now();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("tenant_id", campaign.tenant_id)
            .set("client_company_id", campaign.client_company_id)
            .set("name", &campaign.name)
            .set("objective", &campaign.objective)
            .set("platform", campaign.platform)
            .set("status", campaign.status)
            .set("budget", campaign.budget)
            .set(
                "currency",
                campaign.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
            )
            .set("start_date", campaign.start_date)
            .set("end_date", campaign.end_date)
            .set_json_or_null("target_audience", campaign.target_audience.as_ref())?
            .set_json_or_null("settings", campaign.settings.as_ref())?
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
    pub fn update(&self, id: Uuid, update: &CampaignUpdate) -> Result<Campaign, StoreError> {
        let changes = Changes::new()
            .set_opt("client_company_id", update.client_company_id)
            .set_opt("name", update.name.as_ref())
            .set_opt("objective", update.objective.as_ref())
            .set_opt("platform", update.platform)
            .set_opt("status", update.status)
            .set_opt("budget", update.budget)
            .set_opt("currency", update.currency.as_ref())
            .set_opt("start_date", update.start_date)
            .set_opt("end_date", update.end_date)
            .patch_json(
                "target_audience",
                update.target_audience.as_ref().map(Option::as_ref),
            )?
            .patch_json("settings", update.settings.as_ref().map(Option::as_ref))?
            .set("updated_at", Utc::now());
        self.db.update(TABLE, &by_id(id), &changes, id)
    }

    /// Remove a campaign with its content and metrics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.db.delete(TABLE, &by_id(id))? > 0)
    }

    /// Newest content first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list_content(&self, campaign_id: Uuid) -> Result<Vec<CampaignContent>, StoreError> {
        let select = Select::from(CONTENT)
            .filter(Filter::new().eq("campaign_id", campaign_id))
            .order_by("created_at", Direction::Descending);
        self.db.fetch(&select)
    }

    /// Insert one piece of creative.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a value cannot be encoded or the
    /// write fails.
    pub fn create_content(&self, content: &NewCampaignContent) -> Result<CampaignContent, StoreError> {
        self.db.insert(CONTENT, &content.changes(Utc::now()))
    }

    /// Insert every item or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when any row fails; nothing is written
    /// then.
    pub fn create_content_batch(
        &self,
        items: &[NewCampaignContent],
    ) -> Result<Vec<CampaignContent>, StoreError> {
        let now = Utc::now();
        let rows: Vec<Changes> = items.iter().map(|item| item.changes(now)).collect();
        self.db.insert_many(CONTENT, &rows)
    }

    /// Set the approval flag of one piece of creative.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn approve_content(&self, id: Uuid, approved: bool) -> Result<CampaignContent, StoreError> {
        self.db.update(
            CONTENT,
            &by_id(id),
            &Changes::new().set("approved", approved),
            id,
        )
    }

    /// Remove one piece of creative, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete_content(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.db.delete(CONTENT, &by_id(id))? > 0)
    }

    /// Store one day of figures.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn record_metrics(&self, metrics: &NewCampaignMetrics) -> Result<CampaignMetrics, StoreError> {
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("campaign_id", metrics.campaign_id)
            .set("date", metrics.date)
            .set("impressions", metrics.impressions)
            .set("clicks", metrics.clicks)
            .set("conversions", metrics.conversions)
            .set("spend", metrics.spend)
            .set("revenue", metrics.revenue)
            .set("created_at", Utc::now());
        self.db.insert(METRICS, &changes)
    }

    /// Daily figures in date order, optionally within `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn metrics(
        &self,
        campaign_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<CampaignMetrics>, StoreError> {
        let filter = Filter::new()
            .eq("campaign_id", campaign_id)
            .gte_opt("date", from)
            .lte_opt("date", to);
        let select = Select::from(METRICS)
            .filter(filter)
            .order_by("date", Direction::Ascending);
        self.db.fetch(&select)
    }

    /// Lifetime totals for a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn metrics_summary(&self, campaign_id: Uuid) -> Result<MetricsSummary, StoreError> {
        Ok(self
            .metrics(campaign_id, None, None)?
            .iter()
            .fold(MetricsSummary::default(), MetricsSummary::add))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::fixtures::db;
    use crate::{NewTenant, Tenants};
    use rstest::{fixture, rstest};

    struct Fixture {
        db: Database,
        tenant_id: Uuid,
    }

    #[fixture]
    fn tenant(db: Database) -> Fixture {
        let tenant_id = Tenants::new(&db)
            .create(&NewTenant {
                name: "Umoya Foods".into(),
                slug: "umoya".into(),
                owner_email: "owner@umoya.co.za".into(),
                ..NewTenant::default()
            })
            .expect("create tenant")
            .id;
        Fixture { db, tenant_id }
    }

    fn campaign(tenant_id: Uuid, name: &str) -> NewCampaign {
        NewCampaign {
            tenant_id,
            name: name.into(),
            ..NewCampaign::default()
        }
    }

    fn day(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("valid date")
    }

    #[rstest]
    fn create_applies_defaults(tenant: Fixture) {
        let created = Campaigns::new(&tenant.db)
            .create(&campaign(tenant.tenant_id, "Winter menu"))
            .expect("create");
        assert_eq!(created.platform, CampaignPlatform::Generic);
        assert_eq!(created.status, CampaignStatus::Draft);
        assert_eq!(created.currency, "ZAR");
    }

    #[rstest]
    fn campaigns_need_an_existing_tenant(db: Database) {
        let err = Campaigns::new(&db)
            .create(&campaign(Uuid::new_v4(), "Orphan"))
            .expect_err("foreign key");
        assert!(matches!(err, StoreError::Query { table: "campaigns", .. }));
    }

    #[rstest]
    fn list_is_scoped_and_filtered(tenant: Fixture) {
        let campaigns = Campaigns::new(&tenant.db);
        campaigns
            .create(&NewCampaign {
                platform: CampaignPlatform::Meta,
                objective: Some("Grow lunch orders".into()),
                ..campaign(tenant.tenant_id, "Winter menu")
            })
            .expect("create");
        campaigns
            .create(&NewCampaign {
                status: CampaignStatus::Active,
                ..campaign(tenant.tenant_id, "Catering push")
            })
            .expect("create");

        let meta = CampaignFilter {
            platform: Some(CampaignPlatform::Meta),
            ..CampaignFilter::default()
        };
        assert_eq!(campaigns.list(tenant.tenant_id, &meta).expect("list").total, 1);

        let search = CampaignFilter {
            search: Some("lunch".into()),
            ..CampaignFilter::default()
        };
        let page = campaigns.list(tenant.tenant_id, &search).expect("list");
        assert_eq!(page.items[0].name, "Winter menu");

        let other = campaigns
            .list(Uuid::new_v4(), &CampaignFilter::default())
            .expect("list");
        assert_eq!(other.total, 0);
    }

    #[rstest]
    fn update_moves_to_the_front(tenant: Fixture) {
        let campaigns = Campaigns::new(&tenant.db);
        let first = campaigns
            .create(&campaign(tenant.tenant_id, "First"))
            .expect("create");
        std::thread::sleep(std::time::Duration::from_millis(2));
        campaigns
            .create(&campaign(tenant.tenant_id, "Second"))
            .expect("create");
        std::thread::sleep(std::time::Duration::from_millis(2));
        campaigns
            .update(
                first.id,
                &CampaignUpdate {
                    status: Some(CampaignStatus::Paused),
                    budget: Some(Some(1500.0)),
                    ..CampaignUpdate::default()
                },
            )
            .expect("update");
        let page = campaigns
            .list(tenant.tenant_id, &CampaignFilter::default())
            .expect("list");
        assert_eq!(page.items[0].id, first.id);
        assert_eq!(page.items[0].budget, Some(1500.0));
    }

    #[rstest]
    fn content_batches_are_atomic(tenant: Fixture) {
        let campaigns = Campaigns::new(&tenant.db);
        let created = campaigns
            .create(&campaign(tenant.tenant_id, "Winter menu"))
            .expect("create");
        let item = |content_type, content: &str| NewCampaignContent {
            campaign_id: created.id,
            content_type,
            content: content.into(),
            variant_label: None,
            approved: false,
        };

        let stored = campaigns
            .create_content_batch(&[
                item(ContentType::Headline, "Warm up with soup"),
                item(ContentType::Cta, "Order now"),
            ])
            .expect("batch");
        assert_eq!(stored.len(), 2);

        let orphan = NewCampaignContent {
            campaign_id: Uuid::new_v4(),
            ..item(ContentType::AdCopy, "Lost")
        };
        campaigns
            .create_content_batch(&[item(ContentType::AdCopy, "Kept?"), orphan])
            .expect_err("foreign key");
        assert_eq!(campaigns.list_content(created.id).expect("content").len(), 2);

        let approved = campaigns
            .approve_content(stored[0].id, true)
            .expect("approve");
        assert!(approved.approved);
        assert!(campaigns.delete_content(stored[1].id).expect("delete"));
    }

    #[rstest]
    fn metrics_are_ranged_and_summed(tenant: Fixture) {
        let campaigns = Campaigns::new(&tenant.db);
        let created = campaigns
            .create(&campaign(tenant.tenant_id, "Winter menu"))
            .expect("create");
        for (date, clicks, spend) in [("2025-06-03", 7, 30.0), ("2025-06-01", 5, 20.0), ("2025-06-02", 3, 10.0)] {
            campaigns
                .record_metrics(&NewCampaignMetrics {
                    clicks,
                    spend,
                    impressions: 100,
                    ..NewCampaignMetrics::new(created.id, day(date))
                })
                .expect("record");
        }

        let ranged = campaigns
            .metrics(created.id, Some(day("2025-06-02")), None)
            .expect("metrics");
        let dates: Vec<_> = ranged.iter().map(|m| m.date).collect();
        assert_eq!(dates, vec![day("2025-06-02"), day("2025-06-03")]);

        let summary = campaigns.metrics_summary(created.id).expect("summary");
        assert_eq!(summary.days, 3);
        assert_eq!(summary.clicks, 15);
        assert_eq!(summary.impressions, 300);
        assert_eq!(summary.spend, 60.0);
        assert_eq!(summary.revenue, 0.0);
    }

    #[rstest]
    fn deleting_a_campaign_removes_its_metrics(tenant: Fixture) {
        let campaigns = Campaigns::new(&tenant.db);
        let created = campaigns
            .create(&campaign(tenant.tenant_id, "Winter menu"))
            .expect("create");
        campaigns
            .record_metrics(&NewCampaignMetrics::new(created.id, day("2025-06-01")))
            .expect("record");
        assert!(campaigns.delete(created.id).expect("delete"));
        assert_eq!(campaigns.metrics_summary(created.id).expect("summary").days, 0);
    }
}
