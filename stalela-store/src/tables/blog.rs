//! Blog posts addressed by slug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::row::{FromRow, RowReader};
use crate::{Changes, Database, Direction, Filter, Select, StoreError};

pub(super) const TABLE: &str = "blog_posts";

/// Author recorded when a new post names none.
pub const DEFAULT_AUTHOR: &str = "Stalela";

/// Stored blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    /// Row identifier.
    pub id: Uuid,
    /// URL slug, unique across posts.
    pub slug: String,
    /// Headline.
    pub title: String,
    /// Short teaser shown in listings.
    pub excerpt: Option<String>,
    /// Markdown body.
    pub content: String,
    /// Cover image URL.
    pub cover_image: Option<String>,
    /// Byline.
    pub author: String,
    /// Whether the post is live.
    pub published: bool,
    /// First time the post went live. Unpublishing keeps it.
    pub published_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for BlogPost {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            slug: row.text("slug")?,
            title: row.text("title")?,
            excerpt: row.opt_text("excerpt")?,
            content: row.text("content")?,
            cover_image: row.opt_text("cover_image")?,
            author: row.text("author")?,
            published: row.flag("published")?,
            published_at: row.opt_timestamp("published_at")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Fields for [`Blog::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBlogPost {
    /// URL slug, unique across posts.
    pub slug: String,
    /// Headline.
    pub title: String,
    /// Short teaser shown in listings.
    pub excerpt: Option<String>,
    /// Markdown body.
    pub content: String,
    /// Cover image URL.
    pub cover_image: Option<String>,
    /// [`DEFAULT_AUTHOR`] when absent.
    pub author: Option<String>,
    /// Publish immediately.
    pub published: bool,
}

/// Partial update; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogPostUpdate {
    /// New slug.
    pub slug: Option<String>,
    /// New headline.
    pub title: Option<String>,
    /// New or cleared teaser.
    pub excerpt: Option<Option<String>>,
    /// New body.
    pub content: Option<String>,
    /// New or cleared cover image.
    pub cover_image: Option<Option<String>>,
    /// New byline.
    pub author: Option<String>,
    /// Publish or unpublish.
    pub published: Option<bool>,
}

/// Post counts by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogStats {
    /// Every post.
    pub total: u64,
    /// Live posts.
    pub published: u64,
    /// Unpublished posts.
    pub drafts: u64,
}

/// Facade over the `blog_posts` table.
#[derive(Debug, Clone, Copy)]
pub struct Blog<'db> {
    db: &'db Database,
}

fn by_slug(slug: &str) -> Filter {
    Filter::new().eq("slug", slug)
}

fn visible(filter: Filter, published_only: bool) -> Filter {
    if published_only {
        filter.eq("published", true)
    } else {
        filter
    }
}

impl<'db> Blog<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Newest posts first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self, published_only: bool) -> Result<Vec<BlogPost>, StoreError> {
        let select = Select::from(TABLE)
            .filter(visible(Filter::new(), published_only))
            .order_by("created_at", Direction::Descending);
        self.db.fetch(&select)
    }

    /// A post by slug. Drafts are hidden when `published_only` is set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the query fails.
    pub fn get_by_slug(&self, slug: &str, published_only: bool) -> Result<BlogPost, StoreError> {
        let select = Select::from(TABLE).filter(visible(by_slug(slug), published_only));
        self.db.fetch_one(&select, slug)
    }

    /// Insert a post, stamping `published_at` when it starts live.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a value cannot be encoded or the
    /// write fails.
    pub fn create(&self, post: &NewBlogPost) -> Result<BlogPost, StoreError> {
        let now = Utc::now();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("slug", &post.slug)
            .set("title", &post.title)
            .set("excerpt", &post.excerpt)
            .set("content", &post.content)
            .set("cover_image", &post.cover_image)
            .set("author", post.author.as_deref().unwrap_or(DEFAULT_AUTHOR))
            .set("published", post.published)
            .set("published_at", post.published.then_some(now))
            .set("created_at", now)
            .set("updated_at", now);
        self.db.insert(TABLE, &changes)
    }

    /// Apply `update` to the post at `slug`.
    ///
    /// `published_at` is stamped the first time the post is published.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the write fails.
    pub fn update(&self, slug: &str, update: &BlogPostUpdate) -> Result<BlogPost, StoreError> {
        let now = Utc::now();
        let mut changes = Changes::new()
            .set_opt("slug", update.slug.as_ref())
            .set_opt("title", update.title.as_ref())
            .set_opt("excerpt", update.excerpt.as_ref())
            .set_opt("content", update.content.as_ref())
            .set_opt("cover_image", update.cover_image.as_ref())
            .set_opt("author", update.author.as_ref())
            .set_opt("published", update.published)
            .set("updated_at", now);
        if update.published == Some(true) {
            let current = self.get_by_slug(slug, false)?;
            if current.published_at.is_none() {
                changes = changes.set("published_at", now);
            }
        }
        self.db.update(TABLE, &by_slug(slug), &changes, slug)
    }

    /// Flip the published flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the write fails.
    pub fn toggle_publish(&self, slug: &str) -> Result<BlogPost, StoreError> {
        let current = self.get_by_slug(slug, false)?;
        self.update(
            slug,
            &BlogPostUpdate {
                published: Some(!current.published),
                ..BlogPostUpdate::default()
            },
        )
    }

    /// Remove a post, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete(&self, slug: &str) -> Result<bool, StoreError> {
        Ok(self.db.delete(TABLE, &by_slug(slug))? > 0)
    }

    /// Counts of live and draft posts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn stats(&self) -> Result<BlogStats, StoreError> {
        let total = self.db.count(&Select::from(TABLE))?;
        let published = self
            .db
            .count(&Select::from(TABLE).filter(Filter::new().eq("published", true)))?;
        Ok(BlogStats {
            total,
            published,
            drafts: total.saturating_sub(published),
        })
    }
}
