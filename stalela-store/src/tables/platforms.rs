//! Ad-network credentials held per tenant, one row per platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use super::by_id;
use crate::row::{FromRow, RowReader};
use crate::value::text_enum;
use crate::{CampaignPlatform, Changes, Database, Direction, Filter, Select, StoreError};

const TABLE: &str = "platform_connections";

text_enum! {
    /// State of the link between a tenant and an ad network.
    #[derive(Default)]
    pub enum ConnectionStatus {
        /// No usable credentials.
        #[default]
        Disconnected = "disconnected",
        /// Credentials accepted by the network.
        Connected = "connected",
        /// Access token past its expiry.
        Expired = "expired",
        /// The network rejected the credentials.
        Error = "error",
    }
}

/// Stored connection between a tenant and one ad network.
///
/// Tokens are kept exactly as handed over; encrypting them is the caller's
/// job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConnection {
    /// Row identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Ad network.
    pub platform: CampaignPlatform,
    /// Link state.
    pub status: ConnectionStatus,
    /// Account identifier on the network.
    pub external_account_id: Option<String>,
    /// Account display name on the network.
    pub account_name: Option<String>,
    /// Encrypted access token.
    pub access_token_encrypted: Option<String>,
    /// Encrypted refresh token.
    pub refresh_token_encrypted: Option<String>,
    /// When the access token stops working.
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Permissions granted by the network.
    pub scopes: Vec<String>,
    /// When the link was last established.
    pub connected_at: Option<DateTime<Utc>>,
    /// Network-specific extras.
    pub metadata: Option<Json>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for PlatformConnection {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            tenant_id: row.uuid("tenant_id")?,
            platform: row.parse("platform")?,
            status: row.parse("status")?,
            external_account_id: row.opt_text("external_account_id")?,
            account_name: row.opt_text("account_name")?,
            access_token_encrypted: row.opt_text("access_token_encrypted")?,
            refresh_token_encrypted: row.opt_text("refresh_token_encrypted")?,
            token_expires_at: row.opt_timestamp("token_expires_at")?,
            scopes: row.json("scopes")?,
            connected_at: row.opt_timestamp("connected_at")?,
            metadata: row.opt_json("metadata")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Full replacement of the connection for `(tenant_id, platform)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPlatformConnection {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Ad network.
    pub platform: CampaignPlatform,
    /// Link state.
    pub status: ConnectionStatus,
    /// Account identifier on the network.
    pub external_account_id: Option<String>,
    /// Account display name on the network.
    pub account_name: Option<String>,
    /// Encrypted access token.
    pub access_token_encrypted: Option<String>,
    /// Encrypted refresh token.
    pub refresh_token_encrypted: Option<String>,
    /// When the access token stops working.
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Permissions granted by the network.
    pub scopes: Vec<String>,
    /// When the link was established.
    pub connected_at: Option<DateTime<Utc>>,
    /// Network-specific extras.
    pub metadata: Option<Json>,
}

/// Partial update; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformConnectionUpdate {
    /// New link state.
    pub status: Option<ConnectionStatus>,
    /// New or cleared account identifier.
    pub external_account_id: Option<Option<String>>,
    /// New or cleared account name.
    pub account_name: Option<Option<String>>,
    /// New or cleared access token.
    pub access_token_encrypted: Option<Option<String>>,
    /// New or cleared refresh token.
    pub refresh_token_encrypted: Option<Option<String>>,
    /// New or cleared token expiry.
    pub token_expires_at: Option<Option<DateTime<Utc>>>,
    /// New permission list.
    pub scopes: Option<Vec<String>>,
    /// New or cleared connection time.
    pub connected_at: Option<Option<DateTime<Utc>>>,
    /// New or cleared extras.
    pub metadata: Option<Option<Json>>,
}

/// Facade over the `platform_connections` table.
#[derive(Debug, Clone, Copy)]
pub struct Platforms<'db> {
    db: &'db Database,
}

impl<'db> Platforms<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// A tenant's connections ordered by platform name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list(&self, tenant_id: Uuid) -> Result<Vec<PlatformConnection>, StoreError> {
        let select = Select::from(TABLE)
            .filter(Filter::new().eq("tenant_id", tenant_id))
            .order_by("platform", Direction::Ascending);
        self.db.fetch(&select)
    }

    /// The tenant's connection to `platform`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn get_by_platform(
        &self,
        tenant_id: Uuid,
        platform: CampaignPlatform,
    ) -> Result<Option<PlatformConnection>, StoreError> {
        let filter = Filter::new()
            .eq("tenant_id", tenant_id)
            .eq("platform", platform);
        self.db.fetch_optional(&Select::from(TABLE).filter(filter))
    }

    /// Fetch one connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no connection has `id`.
    pub fn get(&self, id: Uuid) -> Result<PlatformConnection, StoreError> {
        self.db.fetch_one(&Select::from(TABLE).filter(by_id(id)), id)
    }

    /// Insert, or replace the tenant's existing connection to the same
    /// platform. The existing identifier and `created_at` are kept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a value cannot be encoded or the write
    /// fails.
    pub fn upsert(&self, connection: &NewPlatformConnection) -> Result<PlatformConnection, StoreError> {
        let now = Utc::now();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("tenant_id", connection.tenant_id)
            .set("platform", connection.platform)
            .set("status", connection.status)
            .set("external_account_id", &connection.external_account_id)
            .set("account_name", &connection.account_name)
            .set("access_token_encrypted", &connection.access_token_encrypted)
            .set("refresh_token_encrypted", &connection.refresh_token_encrypted)
            .set("token_expires_at", connection.token_expires_at)
            .set_json("scopes", &connection.scopes)?
            .set("connected_at", connection.connected_at)
            .set_json_or_null("metadata", connection.metadata.as_ref())?
            .set("created_at", now)
            .set("updated_at", now);
        self.db.upsert(TABLE, &changes, &["tenant_id", "platform"])
    }

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no connection has `id`.
    pub fn update(
        &self,
        id: Uuid,
        update: &PlatformConnectionUpdate,
    ) -> Result<PlatformConnection, StoreError> {
        let changes = Changes::new()
            .set_opt("status", update.status)
            .set_opt("external_account_id", update.external_account_id.as_ref())
            .set_opt("account_name", update.account_name.as_ref())
            .set_opt("access_token_encrypted", update.access_token_encrypted.as_ref())
            .set_opt("refresh_token_encrypted", update.refresh_token_encrypted.as_ref())
            .set_opt("token_expires_at", update.token_expires_at)
            .set_json_opt("scopes", update.scopes.as_ref())?
            .set_opt("connected_at", update.connected_at)
            .patch_json("metadata", update.metadata.as_ref().map(Option::as_ref))?
            .set("updated_at", Utc::now());
        self.db.update(TABLE, &by_id(id), &changes, id)
    }

    /// Mark the connection disconnected and drop its credentials.
    ///
    /// Tokens, expiry and `connected_at` are cleared; account details stay.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no connection has `id`.
    pub fn disconnect(&self, id: Uuid) -> Result<PlatformConnection, StoreError> {
        let cleared_text: Option<String> = None;
        let cleared_time: Option<DateTime<Utc>> = None;
        let changes = Changes::new()
            .set("status", ConnectionStatus::Disconnected)
            .set("access_token_encrypted", &cleared_text)
            .set("refresh_token_encrypted", &cleared_text)
            .set("token_expires_at", cleared_time)
            .set("connected_at", cleared_time)
            .set("updated_at", Utc::now());
        self.db.update(TABLE, &by_id(id), &changes, id)
    }

    /// Remove a connection, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.db.delete(TABLE, &by_id(id))? > 0)
    }
}
