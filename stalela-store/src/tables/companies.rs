//! Business directory listings and the geo queries over them.

use chrono::{DateTime, Utc};
use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use stalela_core::{
    CandidateStore, LocatedRecord, NearbyQuery, ProximityError, ProximityResolver,
    ProximityResult,
};
use uuid::Uuid;

use super::{DEFAULT_PAGE_LIMIT, by_id, window};
use crate::row::{FromRow, RowReader};
use crate::value::text_enum;
use crate::{Changes, Database, Direction, Filter, Page, Select, StoreError};

const TABLE: &str = "companies";
const PIN_COLUMNS: &[&str] = &["id", "name", "latitude", "longitude", "category", "source", "phone"];
const SUMMARY_COLUMNS: &[&str] = &["id", "name", "city", "province", "source"];

/// Pins returned by [`Companies::bounding_box`] when no limit is given.
pub const DEFAULT_BOUNDING_BOX_LIMIT: u64 = 5000;

/// Matches returned by [`Companies::search`] when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: u64 = 10;

text_enum! {
    /// Directory a listing was collected from.
    pub enum CompanySource {
        /// Yep! directory.
        Yep = "yep",
        /// Bizcommunity directory.
        Bizcommunity = "bizcommunity",
        /// Best Directory.
        Bestdirectory = "bestdirectory",
    }
}

/// A directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Row identifier.
    pub id: Uuid,
    /// Directory the listing came from.
    pub source: CompanySource,
    /// Identifier within the source directory.
    pub source_id: String,
    /// Business name.
    pub name: String,
    /// Long description.
    pub description: Option<String>,
    /// Primary category.
    pub category: Option<String>,
    /// Every category the listing names.
    pub categories: Vec<String>,
    /// Business type, stored in the `type` column.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Main phone number.
    pub phone: Option<String>,
    /// Alternative phone number.
    pub alt_phone: Option<String>,
    /// Mobile number.
    pub mobile: Option<String>,
    /// WhatsApp number.
    pub whatsapp: Option<String>,
    /// Public email address.
    pub email: Option<String>,
    /// Email of the named contact.
    pub contact_email: Option<String>,
    /// Named contact person.
    pub contact_name: Option<String>,
    /// Full address as one line.
    pub address: Option<String>,
    /// First address line.
    pub address_line1: Option<String>,
    /// Suburb.
    pub suburb: Option<String>,
    /// City or town.
    pub city: Option<String>,
    /// South African province.
    pub province: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Business website.
    pub website: Option<String>,
    /// Logo image URL.
    pub logo: Option<String>,
    /// Listing page in the source directory.
    pub source_url: Option<String>,
    /// Company registration number.
    pub registration_number: Option<String>,
    /// VAT number.
    pub vat_number: Option<String>,
    /// Seller identifier in the source directory.
    pub seller_id: Option<String>,
    /// Whether the business reports itself open.
    pub is_open: Option<bool>,
    /// Distance the business serves, in kilometres.
    pub service_range_km: Option<f64>,
    /// Whether the listing is a paid placement.
    pub premium_seller: Option<bool>,
    /// Source directory subscription code.
    pub subscription_status: Option<i64>,
    /// Opening hours as published by the source.
    pub operation_hours: Option<Vec<Json>>,
    /// One-line description.
    pub short_description: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Company {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            source: row.parse("source")?,
            source_id: row.text("source_id")?,
            name: row.text("name")?,
            description: row.opt_text("description")?,
            category: row.opt_text("category")?,
            categories: row.json("categories")?,
            kind: row.opt_text("type")?,
            phone: row.opt_text("phone")?,
            alt_phone: row.opt_text("alt_phone")?,
            mobile: row.opt_text("mobile")?,
            whatsapp: row.opt_text("whatsapp")?,
            email: row.opt_text("email")?,
            contact_email: row.opt_text("contact_email")?,
            contact_name: row.opt_text("contact_name")?,
            address: row.opt_text("address")?,
            address_line1: row.opt_text("address_line1")?,
            suburb: row.opt_text("suburb")?,
            city: row.opt_text("city")?,
            province: row.opt_text("province")?,
            postal_code: row.opt_text("postal_code")?,
            country: row.opt_text("country")?,
            latitude: row.opt_real("latitude")?,
            longitude: row.opt_real("longitude")?,
            website: row.opt_text("website")?,
            logo: row.opt_text("logo")?,
            source_url: row.opt_text("source_url")?,
            registration_number: row.opt_text("registration_number")?,
            vat_number: row.opt_text("vat_number")?,
            seller_id: row.opt_text("seller_id")?,
            is_open: row.opt_flag("is_open")?,
            service_range_km: row.opt_real("service_range_km")?,
            premium_seller: row.opt_flag("premium_seller")?,
            subscription_status: row.opt_int("subscription_status")?,
            operation_hours: row.opt_json("operation_hours")?,
            short_description: row.opt_text("short_description")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

impl LocatedRecord for Company {
    fn coordinates(&self) -> Option<Coord<f64>> {
        Some(Coord {
            x: self.longitude?,
            y: self.latitude?,
        })
    }
}

/// Map marker projection returned by [`Companies::bounding_box`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyPin {
    /// Row identifier.
    pub id: Uuid,
    /// Business name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Primary category.
    pub category: Option<String>,
    /// Directory the listing came from.
    pub source: CompanySource,
    /// Main phone number.
    pub phone: Option<String>,
}

impl FromRow for CompanyPin {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            name: row.text("name")?,
            latitude: row.opt_real("latitude")?,
            longitude: row.opt_real("longitude")?,
            category: row.opt_text("category")?,
            source: row.parse("source")?,
            phone: row.opt_text("phone")?,
        })
    }
}

/// Autocomplete projection returned by [`Companies::search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    /// Row identifier.
    pub id: Uuid,
    /// Business name.
    pub name: String,
    /// City or town.
    pub city: Option<String>,
    /// South African province.
    pub province: Option<String>,
    /// Directory the listing came from.
    pub source: CompanySource,
}

impl FromRow for CompanySummary {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            name: row.text("name")?,
            city: row.opt_text("city")?,
            province: row.opt_text("province")?,
            source: row.parse("source")?,
        })
    }
}

/// Fields for a new listing. Build with [`NewCompany::new`] and struct
/// update syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompany {
    /// Directory the listing came from.
    pub source: CompanySource,
    /// Identifier within the source directory.
    pub source_id: String,
    /// Business name.
    pub name: String,
    /// Long description.
    pub description: Option<String>,
    /// Primary category.
    pub category: Option<String>,
    /// Every category the listing names.
    pub categories: Vec<String>,
    /// Business type, stored in the `type` column.
    pub kind: Option<String>,
    /// Main phone number.
    pub phone: Option<String>,
    /// Alternative phone number.
    pub alt_phone: Option<String>,
    /// Mobile number.
    pub mobile: Option<String>,
    /// WhatsApp number.
    pub whatsapp: Option<String>,
    /// Public email address.
    pub email: Option<String>,
    /// Email of the named contact.
    pub contact_email: Option<String>,
    /// Named contact person.
    pub contact_name: Option<String>,
    /// Full address as one line.
    pub address: Option<String>,
    /// First address line.
    pub address_line1: Option<String>,
    /// Suburb.
    pub suburb: Option<String>,
    /// City or town.
    pub city: Option<String>,
    /// South African province.
    pub province: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Business website.
    pub website: Option<String>,
    /// Logo image URL.
    pub logo: Option<String>,
    /// Listing page in the source directory.
    pub source_url: Option<String>,
    /// Company registration number.
    pub registration_number: Option<String>,
    /// VAT number.
    pub vat_number: Option<String>,
    /// Seller identifier in the source directory.
    pub seller_id: Option<String>,
    /// Whether the business reports itself open.
    pub is_open: Option<bool>,
    /// Distance the business serves, in kilometres.
    pub service_range_km: Option<f64>,
    /// Whether the listing is a paid placement.
    pub premium_seller: Option<bool>,
    /// Source directory subscription code.
    pub subscription_status: Option<i64>,
    /// Opening hours as published by the source.
    pub operation_hours: Option<Vec<Json>>,
    /// One-line description.
    pub short_description: Option<String>,
}

impl NewCompany {
    /// A listing with only its identifying fields set.
    #[must_use]
    pub fn new(source: CompanySource, source_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source,
            source_id: source_id.into(),
            name: name.into(),
            description: None,
            category: None,
            categories: Vec::new(),
            kind: None,
            phone: None,
            alt_phone: None,
            mobile: None,
            whatsapp: None,
            email: None,
            contact_email: None,
            contact_name: None,
            address: None,
            address_line1: None,
            suburb: None,
            city: None,
            province: None,
            postal_code: None,
            country: None,
            latitude: None,
            longitude: None,
            website: None,
            logo: None,
            source_url: None,
            registration_number: None,
            vat_number: None,
            seller_id: None,
            is_open: None,
            service_range_km: None,
            premium_seller: None,
            subscription_status: None,
            operation_hours: None,
            short_description: None,
        }
    }

    /// Set both coordinates.
    #[must_use]
    pub const fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    fn changes(&self, id: Uuid, now: DateTime<Utc>) -> Result<Changes, StoreError> {
        Ok(Changes::new()
            .set("id", id)
            .set("source", self.source)
            .set("source_id", &self.source_id)
            .set("name", &self.name)
            .set("description", &self.description)
            .set("category", &self.category)
            .set_json("categories", &self.categories)?
            .set("type", &self.kind)
            .set("phone", &self.phone)
            .set("alt_phone", &self.alt_phone)
            .set("mobile", &self.mobile)
            .set("whatsapp", &self.whatsapp)
            .set("email", &self.email)
            .set("contact_email", &self.contact_email)
            .set("contact_name", &self.contact_name)
            .set("address", &self.address)
            .set("address_line1", &self.address_line1)
            .set("suburb", &self.suburb)
            .set("city", &self.city)
            .set("province", &self.province)
            .set("postal_code", &self.postal_code)
            .set("country", &self.country)
            .set("latitude", self.latitude)
            .set("longitude", self.longitude)
            .set("website", &self.website)
            .set("logo", &self.logo)
            .set("source_url", &self.source_url)
            .set("registration_number", &self.registration_number)
            .set("vat_number", &self.vat_number)
            .set("seller_id", &self.seller_id)
            .set("is_open", self.is_open)
            .set("service_range_km", self.service_range_km)
            .set("premium_seller", self.premium_seller)
            .set("subscription_status", self.subscription_status)
            .set_json_or_null("operation_hours", self.operation_hours.as_ref())?
            .set("short_description", &self.short_description)
            .set("created_at", now)
            .set("updated_at", now))
    }
}

/// Partial update for a listing.
///
/// `None` leaves a column untouched. For nullable columns `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyUpdate {
    /// Business name.
    pub name: Option<String>,
    /// Long description.
    pub description: Option<Option<String>>,
    /// Primary category.
    pub category: Option<Option<String>>,
    /// Every category the listing names.
    pub categories: Option<Vec<String>>,
    /// Business type, stored in the `type` column.
    pub kind: Option<Option<String>>,
    /// Main phone number.
    pub phone: Option<Option<String>>,
    /// Alternative phone number.
    pub alt_phone: Option<Option<String>>,
    /// Mobile number.
    pub mobile: Option<Option<String>>,
    /// WhatsApp number.
    pub whatsapp: Option<Option<String>>,
    /// Public email address.
    pub email: Option<Option<String>>,
    /// Email of the named contact.
    pub contact_email: Option<Option<String>>,
    /// Named contact person.
    pub contact_name: Option<Option<String>>,
    /// Full address as one line.
    pub address: Option<Option<String>>,
    /// First address line.
    pub address_line1: Option<Option<String>>,
    /// Suburb.
    pub suburb: Option<Option<String>>,
    /// City or town.
    pub city: Option<Option<String>>,
    /// South African province.
    pub province: Option<Option<String>>,
    /// Postal code.
    pub postal_code: Option<Option<String>>,
    /// Country.
    pub country: Option<Option<String>>,
    /// Latitude in degrees.
    pub latitude: Option<Option<f64>>,
    /// Longitude in degrees.
    pub longitude: Option<Option<f64>>,
    /// Business website.
    pub website: Option<Option<String>>,
    /// Logo image URL.
    pub logo: Option<Option<String>>,
    /// Listing page in the source directory.
    pub source_url: Option<Option<String>>,
    /// Company registration number.
    pub registration_number: Option<Option<String>>,
    /// VAT number.
    pub vat_number: Option<Option<String>>,
    /// Seller identifier in the source directory.
    pub seller_id: Option<Option<String>>,
    /// Whether the business reports itself open.
    pub is_open: Option<Option<bool>>,
    /// Distance the business serves, in kilometres.
    pub service_range_km: Option<Option<f64>>,
    /// Whether the listing is a paid placement.
    pub premium_seller: Option<Option<bool>>,
    /// Source directory subscription code.
    pub subscription_status: Option<Option<i64>>,
    /// Opening hours as published by the source.
    pub operation_hours: Option<Option<Vec<Json>>>,
    /// One-line description.
    pub short_description: Option<Option<String>>,
}

impl CompanyUpdate {
    fn changes(&self, now: DateTime<Utc>) -> Result<Changes, StoreError> {
        Ok(Changes::new()
            .set_opt("name", self.name.as_ref())
            .set_opt("description", self.description.as_ref())
            .set_opt("category", self.category.as_ref())
            .set_json_opt("categories", self.categories.as_ref())?
            .set_opt("type", self.kind.as_ref())
            .set_opt("phone", self.phone.as_ref())
            .set_opt("alt_phone", self.alt_phone.as_ref())
            .set_opt("mobile", self.mobile.as_ref())
            .set_opt("whatsapp", self.whatsapp.as_ref())
            .set_opt("email", self.email.as_ref())
            .set_opt("contact_email", self.contact_email.as_ref())
            .set_opt("contact_name", self.contact_name.as_ref())
            .set_opt("address", self.address.as_ref())
            .set_opt("address_line1", self.address_line1.as_ref())
            .set_opt("suburb", self.suburb.as_ref())
            .set_opt("city", self.city.as_ref())
            .set_opt("province", self.province.as_ref())
            .set_opt("postal_code", self.postal_code.as_ref())
            .set_opt("country", self.country.as_ref())
            .set_opt("latitude", self.latitude)
            .set_opt("longitude", self.longitude)
            .set_opt("website", self.website.as_ref())
            .set_opt("logo", self.logo.as_ref())
            .set_opt("source_url", self.source_url.as_ref())
            .set_opt("registration_number", self.registration_number.as_ref())
            .set_opt("vat_number", self.vat_number.as_ref())
            .set_opt("seller_id", self.seller_id.as_ref())
            .set_opt("is_open", self.is_open)
            .set_opt("service_range_km", self.service_range_km)
            .set_opt("premium_seller", self.premium_seller)
            .set_opt("subscription_status", self.subscription_status)
            .patch_json(
                "operation_hours",
                self.operation_hours.as_ref().map(Option::as_ref),
            )?
            .set_opt("short_description", self.short_description.as_ref())
            .set("updated_at", now))
    }
}

/// Filters for [`Companies::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    /// Present: only listings from this directory.
    pub source: Option<CompanySource>,
    /// Present: exact province match.
    pub province: Option<String>,
    /// Present: exact city match.
    pub city: Option<String>,
    /// Present: case-insensitive substring of name, email or phone.
    pub search: Option<String>,
    /// `true`: only listings with both coordinates.
    pub has_gps: bool,
    /// Page size, [`DEFAULT_PAGE_LIMIT`] when absent.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
}

/// Viewport for [`Companies::bounding_box`]. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBoxQuery {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lng: f64,
    /// Eastern edge.
    pub max_lng: f64,
    /// Present: only listings from this directory.
    pub source: Option<CompanySource>,
    /// Pin cap, [`DEFAULT_BOUNDING_BOX_LIMIT`] when absent.
    pub limit: Option<u64>,
}

impl BoundingBoxQuery {
    /// A viewport with no source filter and the default cap.
    #[must_use]
    pub const fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
            source: None,
            limit: None,
        }
    }
}

/// Listings per directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    /// Group value.
    pub source: String,
    /// Rows in the group.
    pub count: u64,
}

/// Listings per province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceCount {
    /// Province name.
    pub province: String,
    /// Listings in the province.
    pub count: u64,
}

/// Dashboard totals for the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyStats {
    /// Every listing.
    pub total_companies: u64,
    /// Listings with a phone number.
    pub with_phone: u64,
    /// Listings with an email address.
    pub with_email: u64,
    /// Listings with a website.
    pub with_website: u64,
    /// Listings with both coordinates.
    pub with_gps: u64,
    /// Largest directory first.
    pub by_source: Vec<SourceCount>,
    /// Largest province first; listings without a province are omitted.
    pub by_province: Vec<ProvinceCount>,
}

/// Facade over the `companies` table.
#[derive(Debug, Clone, Copy)]
pub struct Companies<'db> {
    db: &'db Database,
}

impl<'db> Companies<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Filtered, name-ordered page of listings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self, filter: &CompanyFilter) -> Result<Page<Company>, StoreError> {
        let mut predicates = Filter::new()
            .eq_opt("source", filter.source)
            .eq_opt("province", filter.province.as_deref())
            .eq_opt("city", filter.city.as_deref());
        if let Some(search) = &filter.search {
            predicates = predicates.ilike_any(&["name", "email", "phone"], search);
        }
        if filter.has_gps {
            predicates = predicates.not_null("latitude").not_null("longitude");
        }
        let select = Select::from(TABLE)
            .filter(predicates)
            .order_by("name", Direction::Ascending);
        let select = window(
            select,
            Some(filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT)),
            filter.offset,
        );
        self.db.page(&select)
    }

    /// Fetch one listing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the query fails.
    pub fn get(&self, id: Uuid) -> Result<Company, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Insert a listing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when `(source, source_id)` already exists
    /// or the insert fails.
    pub fn create(&self, company: &NewCompany) -> Result<Company, StoreError> {
        self.db
            .insert(TABLE, &company.changes(Uuid::new_v4(), Utc::now())?)
    }

    /// Insert, or refresh the listing sharing `(source, source_id)`.
    ///
    /// The existing identifier and `created_at` survive a refresh.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a value cannot be encoded or the
    /// write fails.
    pub fn upsert(&self, company: &NewCompany) -> Result<Company, StoreError> {
        self.db.upsert(
            TABLE,
            &company.changes(Uuid::new_v4(), Utc::now())?,
            &["source", "source_id"],
        )
    }

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError`] when the write fails.
    pub fn update(&self, id: Uuid, update: &CompanyUpdate) -> Result<Company, StoreError> {
        self.db
            .update(TABLE, &by_id(id), &update.changes(Utc::now())?, id)
    }

    /// Remove a listing. Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.db.delete(TABLE, &by_id(id))? > 0)
    }

    /// Directories with at least one listing, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn sources(&self) -> Result<Vec<CompanySource>, StoreError> {
        self.distinct("source", Filter::new())?
            .into_iter()
            .map(|text| {
                text.parse()
                    .map_err(|_| StoreError::InvalidValue {
                        column: "source",
                        value: text,
                    })
            })
            .collect()
    }

    /// Distinct non-null provinces, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn provinces(&self) -> Result<Vec<String>, StoreError> {
        self.distinct("province", Filter::new())
    }

    /// Distinct non-null cities, sorted, optionally within one province.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn cities(&self, province: Option<&str>) -> Result<Vec<String>, StoreError> {
        self.distinct("city", Filter::new().eq_opt("province", province))
    }

    fn distinct(&self, column: &'static str, filter: Filter) -> Result<Vec<String>, StoreError> {
        let select = Select::from(TABLE)
            .columns(&[column])
            .distinct()
            .filter(filter.not_null(column))
            .order_by(column, Direction::Ascending);
        self.db.fetch(&select)
    }

    /// Directory totals and coverage counts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn stats(&self) -> Result<CompanyStats, StoreError> {
        let count = |filter: Filter| self.db.count(&Select::from(TABLE).filter(filter));
        let by_source = self
            .db
            .group_counts(TABLE, "source", Filter::new())?
            .into_iter()
            .map(|(source, count)| SourceCount { source, count })
            .collect();
        let by_province = self
            .db
            .group_counts(TABLE, "province", Filter::new())?
            .into_iter()
            .map(|(province, count)| ProvinceCount { province, count })
            .collect();
        Ok(CompanyStats {
            total_companies: count(Filter::new())?,
            with_phone: count(Filter::new().not_null("phone"))?,
            with_email: count(Filter::new().not_null("email"))?,
            with_website: count(Filter::new().not_null("website"))?,
            with_gps: count(Filter::new().not_null("latitude").not_null("longitude"))?,
            by_source,
            by_province,
        })
    }

    /// Listings within `radius_km` of `center`, nearest first.
    ///
    /// `limit` defaults to ten. Results may hold fewer than `limit`
    /// listings when the bounding box is dense; see
    /// [`stalela_core::ProximityResolver`].
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::InvalidInput`] for an out-of-range
    /// centre, a negative or `NaN` radius, or a zero limit, and
    /// [`ProximityError::Store`] when the candidate query fails.
    pub fn nearby(
        &self,
        center: Coord<f64>,
        radius_km: f64,
        limit: Option<usize>,
    ) -> Result<Vec<ProximityResult<Company>>, ProximityError<StoreError>> {
        let mut query = NearbyQuery::new(center, radius_km);
        if let Some(limit) = limit {
            query = query.with_limit(limit);
        }
        ProximityResolver::new(*self).find_nearby(&query)
    }

    /// Pins inside a viewport, for map rendering.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn bounding_box(&self, query: &BoundingBoxQuery) -> Result<Vec<CompanyPin>, StoreError> {
        let filter = Filter::new()
            .gte("latitude", query.min_lat)
            .lte("latitude", query.max_lat)
            .gte("longitude", query.min_lng)
            .lte("longitude", query.max_lng)
            .eq_opt("source", query.source);
        let select = Select::from(TABLE)
            .columns(PIN_COLUMNS)
            .filter(filter)
            .limit(query.limit.unwrap_or(DEFAULT_BOUNDING_BOX_LIMIT));
        self.db.fetch(&select)
    }

    /// Case-insensitive name search for autocomplete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn search(&self, needle: &str, limit: Option<u64>) -> Result<Vec<CompanySummary>, StoreError> {
        let select = Select::from(TABLE)
            .columns(SUMMARY_COLUMNS)
            .filter(Filter::new().ilike_any(&["name"], needle))
            .limit(limit.unwrap_or(DEFAULT_SEARCH_LIMIT));
        self.db.fetch(&select)
    }
}

impl CandidateStore for Companies<'_> {
    type Record = Company;
    type Error = StoreError;

    fn fetch_candidates(&self, bbox: &Rect<f64>, cap: usize) -> Result<Vec<Company>, StoreError> {
        let (min, max) = (bbox.min(), bbox.max());
        let filter = Filter::new()
            .not_null("latitude")
            .not_null("longitude")
            .gte("latitude", min.y)
            .lte("latitude", max.y)
            .gte("longitude", min.x)
            .lte("longitude", max.x);
        let select = Select::from(TABLE)
            .filter(filter)
            .limit(u64::try_from(cap).unwrap_or(u64::MAX));
        self.db.fetch(&select)
    }
}
