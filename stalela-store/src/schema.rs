//! Table and index bootstrap.
//!
//! Every statement is `IF NOT EXISTS`, so bootstrapping an existing
//! database is a no-op. Columns use the storage formats in
//! [`crate::value`].

use rusqlite::{Connection, Transaction};

use crate::StoreError;

const TABLES: &[(&str, &str)] = &[
    (
        "create companies",
        "CREATE TABLE IF NOT EXISTS companies (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            source_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            category TEXT,
            categories TEXT NOT NULL DEFAULT '[]',
            type TEXT,
            phone TEXT,
            alt_phone TEXT,
            mobile TEXT,
            whatsapp TEXT,
            email TEXT,
            contact_email TEXT,
            contact_name TEXT,
            address TEXT,
            address_line1 TEXT,
            suburb TEXT,
            city TEXT,
            province TEXT,
            postal_code TEXT,
            country TEXT,
            latitude REAL CHECK (latitude BETWEEN -90 AND 90),
            longitude REAL CHECK (longitude BETWEEN -180 AND 180),
            website TEXT,
            logo TEXT,
            source_url TEXT,
            registration_number TEXT,
            vat_number TEXT,
            seller_id TEXT,
            is_open INTEGER,
            service_range_km REAL,
            premium_seller INTEGER,
            subscription_status INTEGER,
            operation_hours TEXT,
            short_description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (source, source_id)
        )",
    ),
    (
        "create leads",
        "CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            source TEXT NOT NULL,
            name TEXT,
            phone TEXT,
            data TEXT,
            created_at TEXT NOT NULL
        )",
    ),
    (
        "create customers",
        "CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            lead_id TEXT REFERENCES leads(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            company TEXT,
            status TEXT NOT NULL DEFAULT 'prospect',
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ),
    (
        "create blog_posts",
        "CREATE TABLE IF NOT EXISTS blog_posts (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            excerpt TEXT,
            content TEXT NOT NULL,
            cover_image TEXT,
            author TEXT NOT NULL DEFAULT 'Stalela',
            published INTEGER NOT NULL DEFAULT 0,
            published_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ),
    (
        "create seo_overrides",
        "CREATE TABLE IF NOT EXISTS seo_overrides (
            id TEXT PRIMARY KEY,
            page_path TEXT NOT NULL UNIQUE,
            title_override TEXT,
            meta_description TEXT,
            keywords TEXT NOT NULL DEFAULT '[]',
            og_image_url TEXT,
            updated_at TEXT NOT NULL
        )",
    ),
    (
        "create tenants",
        "CREATE TABLE IF NOT EXISTS tenants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            owner_email TEXT NOT NULL,
            plan TEXT NOT NULL DEFAULT 'free',
            status TEXT NOT NULL DEFAULT 'trial',
            onboarding_status TEXT NOT NULL DEFAULT 'pending',
            website_url TEXT,
            settings TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ),
    (
        "create tenant_users",
        "CREATE TABLE IF NOT EXISTS tenant_users (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'member',
            created_at TEXT NOT NULL,
            UNIQUE (tenant_id, user_id)
        )",
    ),
    (
        "create campaigns",
        "CREATE TABLE IF NOT EXISTS campaigns (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            client_company_id TEXT,
            name TEXT NOT NULL,
            objective TEXT,
            platform TEXT NOT NULL DEFAULT 'generic',
            status TEXT NOT NULL DEFAULT 'draft',
            budget REAL,
            currency TEXT NOT NULL DEFAULT 'ZAR',
            start_date TEXT,
            end_date TEXT,
            target_audience TEXT,
            settings TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ),
    (
        "create campaign_content",
        "CREATE TABLE IF NOT EXISTS campaign_content (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
            content_type TEXT NOT NULL,
            content TEXT NOT NULL,
            variant_label TEXT,
            approved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
    ),
    (
        "create campaign_metrics",
        "CREATE TABLE IF NOT EXISTS campaign_metrics (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            impressions INTEGER NOT NULL DEFAULT 0,
            clicks INTEGER NOT NULL DEFAULT 0,
            conversions INTEGER NOT NULL DEFAULT 0,
            spend REAL NOT NULL DEFAULT 0,
            revenue REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
    ),
    (
        "create website_audits",
        "CREATE TABLE IF NOT EXISTS website_audits (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            url TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            report TEXT,
            crawl_data TEXT,
            error_message TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ),
    (
        "create daily_briefings",
        "CREATE TABLE IF NOT EXISTS daily_briefings (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            company_id TEXT NOT NULL,
            company_name TEXT NOT NULL,
            opportunity_type TEXT NOT NULL,
            opportunity_summary TEXT NOT NULL,
            research_summary TEXT,
            email_draft_subject TEXT,
            email_draft_body TEXT,
            call_script TEXT,
            priority INTEGER NOT NULL DEFAULT 5,
            status TEXT NOT NULL DEFAULT 'pending',
            reviewed_at TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (company_id, date)
        )",
    ),
    (
        "create daily_news",
        "CREATE TABLE IF NOT EXISTS daily_news (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL UNIQUE,
            content TEXT NOT NULL,
            topics TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )",
    ),
    (
        "create platform_connections",
        "CREATE TABLE IF NOT EXISTS platform_connections (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            platform TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'disconnected',
            external_account_id TEXT,
            account_name TEXT,
            access_token_encrypted TEXT,
            refresh_token_encrypted TEXT,
            token_expires_at TEXT,
            scopes TEXT NOT NULL DEFAULT '[]',
            connected_at TEXT,
            metadata TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (tenant_id, platform)
        )",
    ),
    (
        "create competitors",
        "CREATE TABLE IF NOT EXISTS competitors (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            website TEXT,
            industry TEXT,
            discovered_via TEXT NOT NULL DEFAULT 'manual',
            notes TEXT,
            ad_analysis TEXT,
            last_analyzed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ),
    (
        "create company_research",
        "CREATE TABLE IF NOT EXISTS company_research (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            report TEXT NOT NULL,
            model TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    ),
    (
        "create chat_sessions",
        "CREATE TABLE IF NOT EXISTS chat_sessions (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ),
    (
        "create chat_messages",
        "CREATE TABLE IF NOT EXISTS chat_messages (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    ),
    (
        "create generated_leads",
        "CREATE TABLE IF NOT EXISTS generated_leads (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            company_id TEXT REFERENCES companies(id) ON DELETE SET NULL,
            company_name TEXT NOT NULL,
            contact_name TEXT,
            email TEXT,
            phone TEXT,
            website TEXT,
            reason TEXT,
            relevance_score REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'new',
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ),
];

const INDEXES: &[(&str, &str)] = &[
    (
        "index companies by position",
        "CREATE INDEX IF NOT EXISTS idx_companies_position ON companies(latitude, longitude)",
    ),
    (
        "index companies by name",
        "CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name)",
    ),
    (
        "index companies by province and city",
        "CREATE INDEX IF NOT EXISTS idx_companies_region ON companies(province, city)",
    ),
    (
        "index leads by creation",
        "CREATE INDEX IF NOT EXISTS idx_leads_created ON leads(created_at)",
    ),
    (
        "index customers by creation",
        "CREATE INDEX IF NOT EXISTS idx_customers_created ON customers(created_at)",
    ),
    (
        "index campaigns by tenant",
        "CREATE INDEX IF NOT EXISTS idx_campaigns_tenant ON campaigns(tenant_id, updated_at)",
    ),
    (
        "index campaign metrics by day",
        "CREATE INDEX IF NOT EXISTS idx_campaign_metrics_day ON campaign_metrics(campaign_id, date)",
    ),
    (
        "index audits by tenant",
        "CREATE INDEX IF NOT EXISTS idx_website_audits_tenant ON website_audits(tenant_id, created_at)",
    ),
    (
        "index briefings by day",
        "CREATE INDEX IF NOT EXISTS idx_daily_briefings_day ON daily_briefings(date, priority)",
    ),
    (
        "index competitors by tenant",
        "CREATE INDEX IF NOT EXISTS idx_competitors_tenant ON competitors(tenant_id, created_at)",
    ),
    (
        "index research by company",
        "CREATE INDEX IF NOT EXISTS idx_company_research_company ON company_research(company_id, created_at)",
    ),
    (
        "index chat sessions by owner",
        "CREATE INDEX IF NOT EXISTS idx_chat_sessions_owner ON chat_sessions(tenant_id, user_id, updated_at)",
    ),
    (
        "index chat messages by session",
        "CREATE INDEX IF NOT EXISTS idx_chat_messages_session ON chat_messages(session_id, created_at)",
    ),
    (
        "index generated leads by relevance",
        "CREATE INDEX IF NOT EXISTS idx_generated_leads_relevance ON generated_leads(tenant_id, relevance_score)",
    ),
];

/// Create all tables and indexes inside one transaction.
pub(crate) fn bootstrap(connection: &mut Connection) -> Result<(), StoreError> {
    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Bootstrap {
            step: "begin schema transaction",
            source,
        })?;

    for &(step, sql) in TABLES.iter().chain(INDEXES) {
        run_step(&transaction, step, sql)?;
    }

    transaction
        .commit()
        .map_err(|source| StoreError::Bootstrap {
            step: "commit schema transaction",
            source,
        })
}

fn run_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreError> {
    log::debug!("schema: {step}");
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreError::Bootstrap { step, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn table_names(connection: &Connection) -> Vec<String> {
        let mut statement = connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .expect("prepare");
        statement
            .query_map([], |row| row.get(0))
            .expect("query")
            .collect::<Result<_, _>>()
            .expect("collect")
    }

    #[rstest]
    fn creates_every_table() {
        let mut connection = Connection::open_in_memory().expect("open");
        bootstrap(&mut connection).expect("bootstrap");
        let names = table_names(&connection);
        assert_eq!(names.len(), TABLES.len());
        assert!(names.iter().any(|name| name == "companies"));
        assert!(names.iter().any(|name| name == "daily_news"));
        assert!(names.iter().any(|name| name == "chat_messages"));
        assert!(names.iter().any(|name| name == "generated_leads"));
    }

    #[rstest]
    fn bootstrapping_twice_is_a_no_op() {
        let mut connection = Connection::open_in_memory().expect("open");
        bootstrap(&mut connection).expect("first");
        connection
            .execute(
                "INSERT INTO leads (id, email, source, created_at) VALUES ('l1', 'a@b.c', 'web', 'now')",
                [],
            )
            .expect("seed");
        bootstrap(&mut connection).expect("second");
        let leads: i64 = connection
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))
            .expect("count");
        assert_eq!(leads, 1);
    }
}
