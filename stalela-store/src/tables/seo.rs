//! Per-page SEO metadata overrides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::by_id;
use crate::row::{FromRow, RowReader};
use crate::{Changes, Database, Direction, Filter, Select, StoreError};

const TABLE: &str = "seo_overrides";

/// Stored metadata override for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoOverride {
    /// Row identifier.
    pub id: Uuid,
    /// Site path such as `/services`.
    pub page_path: String,
    /// Replacement `<title>` text.
    pub title_override: Option<String>,
    /// Replacement meta description.
    pub meta_description: Option<String>,
    /// Meta keywords.
    pub keywords: Vec<String>,
    /// Open Graph image URL.
    pub og_image_url: Option<String>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for SeoOverride {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            page_path: row.text("page_path")?,
            title_override: row.opt_text("title_override")?,
            meta_description: row.opt_text("meta_description")?,
            keywords: row.json("keywords")?,
            og_image_url: row.opt_text("og_image_url")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Full replacement of the override for `page_path`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeoUpsert {
    /// Site path the override applies to.
    pub page_path: String,
    /// Replacement `<title>` text.
    pub title_override: Option<String>,
    /// Replacement meta description.
    pub meta_description: Option<String>,
    /// Empty list when absent.
    pub keywords: Option<Vec<String>>,
    /// Open Graph image URL.
    pub og_image_url: Option<String>,
}

/// Facade over the `seo_overrides` table.
#[derive(Debug, Clone, Copy)]
pub struct Seo<'db> {
    db: &'db Database,
}

impl<'db> Seo<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Every override, ordered by path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self) -> Result<Vec<SeoOverride>, StoreError> {
        self.db
            .fetch(&Select::from(TABLE).order_by("page_path", Direction::Ascending))
    }

    /// Fetch one override.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the query fails.
    pub fn get(&self, id: Uuid) -> Result<SeoOverride, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Override for `page_path`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn get_by_path(&self, page_path: &str) -> Result<Option<SeoOverride>, StoreError> {
        self.db.fetch_optional(
            &Select::from(TABLE).filter(Filter::new().eq("page_path", page_path)),
        )
    }

    /// Insert or replace the override keyed by `page_path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a value cannot be encoded or the
    /// write fails.
    pub fn upsert(&self, seo: &SeoUpsert) -> Result<SeoOverride, StoreError> {
        let keywords = seo.keywords.as_deref().unwrap_or_default();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("page_path", &seo.page_path)
            .set("title_override", &seo.title_override)
            .set("meta_description", &seo.meta_description)
            .set_json("keywords", keywords)?
            .set("og_image_url", &seo.og_image_url)
            .set("updated_at", Utc::now());
        self.db.upsert(TABLE, &changes, &["page_path"])
    }

    /// Remove an override, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.db.delete(TABLE, &by_id(id))? > 0)
    }
}
