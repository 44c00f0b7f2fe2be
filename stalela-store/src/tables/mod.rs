//! Per-table facades.
//!
//! Each facade borrows a [`Database`](crate::Database) and maps method calls
//! to filtered statements. Listing filters are plain structs whose optional
//! fields each add one predicate when present and nothing when absent.

mod audits;
mod blog;
mod briefings;
mod campaigns;
mod chat;
mod companies;
mod competitors;
mod customers;
mod lead_gen;
mod leads;
mod metrics;
mod news;
mod platforms;
mod research;
mod seo;
mod tenants;

pub use audits::{
    AuditReport, AuditSection, AuditStatus, AuditUpdate, Audits, CompetitorSignal, NewAudit,
    WebsiteAudit,
};
pub use blog::{Blog, BlogPost, BlogPostUpdate, BlogStats, DEFAULT_AUTHOR, NewBlogPost};
pub use briefings::{
    BriefingStats, BriefingStatus, BriefingUpdate, Briefings, DailyBriefing, NewBriefing,
};
pub use campaigns::{
    Campaign, CampaignContent, CampaignFilter, CampaignMetrics, CampaignPlatform, CampaignStatus,
    CampaignUpdate, Campaigns, ContentType, MetricsSummary, NewCampaign, NewCampaignContent,
    NewCampaignMetrics,
};
pub use chat::{
    Chat, ChatMessage, ChatRole, ChatSession, DEFAULT_SESSION_TITLE, NewChatMessage,
    NewChatSession,
};
pub use companies::{
    BoundingBoxQuery, Companies, Company, CompanyFilter, CompanyPin, CompanySource, CompanyStats,
    CompanySummary, CompanyUpdate, DEFAULT_BOUNDING_BOX_LIMIT, DEFAULT_SEARCH_LIMIT, NewCompany,
    ProvinceCount, SourceCount,
};
pub use competitors::{
    Competitor, CompetitorAnalysis, CompetitorDiscovery, CompetitorUpdate, Competitors,
    NewCompetitor,
};
pub use customers::{
    Customer, CustomerFilter, CustomerOverrides, CustomerStatus, CustomerUpdate, Customers,
    NewCustomer,
};
pub use lead_gen::{
    GeneratedLead, GeneratedLeadFilter, GeneratedLeadStatus, GeneratedLeadUpdate, LeadGen,
    NewGeneratedLead,
};
pub use leads::{Lead, LeadFilter, Leads, NewLead};
pub use metrics::{DailyCount, MAX_SERIES_DAYS, Metrics, MetricsSnapshot, RecentPost};
pub use news::{DailyNews, News, NewsDigest};
pub use platforms::{
    ConnectionStatus, NewPlatformConnection, PlatformConnection, PlatformConnectionUpdate,
    Platforms,
};
pub use research::{
    CompanyResearch, DEFAULT_RESEARCH_LIMIT, DEFAULT_RESEARCH_MAX_AGE_DAYS, DEFAULT_RESEARCH_MODEL,
    Research,
};
pub use seo::{Seo, SeoOverride, SeoUpsert};
pub use tenants::{
    NewTenant, NewTenantUser, OnboardingStatus, Tenant, TenantFilter, TenantMembership, TenantPlan,
    TenantRole, TenantStatus, TenantUpdate, TenantUser, Tenants,
};

use uuid::Uuid;

use crate::{Filter, Select};

/// Rows returned by paged listings when no limit is given.
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Dates returned by `list_dates` queries when no limit is given.
pub const DEFAULT_DATE_LIMIT: u64 = 14;

/// Page size applied when only an offset is given.
const OFFSET_ONLY_LIMIT: u64 = 20;

fn by_id(id: Uuid) -> Filter {
    Filter::new().eq("id", id)
}

/// Apply `limit`/`offset`, falling back to a window of twenty rows when
/// only an offset is given.
fn window(select: Select, limit: Option<u64>, offset: Option<u64>) -> Select {
    let select = match (limit, offset) {
        (Some(limit), _) => select.limit(limit),
        (None, Some(_)) => select.limit(OFFSET_ONLY_LIMIT),
        (None, None) => select,
    };
    match offset {
        Some(offset) if offset > 0 => select.offset(offset),
        _ => select,
    }
}
