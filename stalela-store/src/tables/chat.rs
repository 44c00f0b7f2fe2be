//! Assistant chat sessions and their message history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::by_id;
use crate::row::{FromRow, RowReader};
use crate::value::text_enum;
use crate::{Changes, Database, Direction, Filter, Select, StoreError};

const SESSIONS: &str = "chat_sessions";
const MESSAGES: &str = "chat_messages";

/// Title given to a session created without one.
pub const DEFAULT_SESSION_TITLE: &str = "New conversation";

text_enum! {
    /// Author of a chat message.
    pub enum ChatRole {
        /// The signed-in user.
        User = "user",
        /// The assistant.
        Assistant = "assistant",
        /// Instructions injected by the application.
        System = "system",
    }
}

/// A conversation owned by one user within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Row identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Identifier issued by the authentication provider.
    pub user_id: String,
    /// Display title.
    pub title: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last message or rename.
    pub updated_at: DateTime<Utc>,
}

impl FromRow for ChatSession {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            tenant_id: row.uuid("tenant_id")?,
            user_id: row.text("user_id")?,
            title: row.text("title")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

/// Fields for [`Chat::create_session`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewChatSession {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Identifier issued by the authentication provider.
    pub user_id: String,
    /// [`DEFAULT_SESSION_TITLE`] when absent or blank.
    pub title: Option<String>,
}

/// One message in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Row identifier.
    pub id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// Author.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FromRow for ChatMessage {
    fn from_row(row: &RowReader<'_, '_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.uuid("id")?,
            session_id: row.uuid("session_id")?,
            role: row.parse("role")?,
            content: row.text("content")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

/// Fields for [`Chat::add_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    /// Owning session.
    pub session_id: Uuid,
    /// Author.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

/// Facade over the chat tables.
#[derive(Debug, Clone, Copy)]
pub struct Chat<'db> {
    db: &'db Database,
}

impl<'db> Chat<'db> {
    /// Borrow `db` for queries.
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Start a session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the tenant does not exist or the insert
    /// fails.
    pub fn create_session(&self, session: &NewChatSession) -> Result<ChatSession, StoreError> {
        let now = Utc::now();
        let title = session
            .title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(DEFAULT_SESSION_TITLE);
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("tenant_id", session.tenant_id)
            .set("user_id", &session.user_id)
            .set("title", title)
            .set("created_at", now)
            .set("updated_at", now);
        self.db.insert(SESSIONS, &changes)
    }

    /// A user's sessions within a tenant, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn list_sessions(&self, tenant_id: Uuid, user_id: &str) -> Result<Vec<ChatSession>, StoreError> {
        let select = Select::from(SESSIONS)
            .filter(Filter::new().eq("tenant_id", tenant_id).eq("user_id", user_id))
            .order_by("updated_at", Direction::Descending);
        self.db.fetch(&select)
    }

    /// Fetch one session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no session has `id`.
    pub fn get_session(&self, id: Uuid) -> Result<ChatSession, StoreError> {
        self.db.fetch_one(&Select::from(SESSIONS).filter(by_id(id)), id)
    }

    /// Rename a session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no session has `id`.
    pub fn update_session_title(&self, id: Uuid, title: &str) -> Result<ChatSession, StoreError> {
        let changes = Changes::new()
            .set("title", title)
            .set("updated_at", Utc::now());
        self.db.update(SESSIONS, &by_id(id), &changes, id)
    }

    /// Remove a session and its messages, messages first, in one
    /// transaction. Returns whether the session existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when either delete fails; nothing is removed
    /// then.
    pub fn delete_session(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self.db.delete_in_order(&[
            (MESSAGES, Filter::new().eq("session_id", id)),
            (SESSIONS, by_id(id)),
        ])?;
        Ok(removed.last().is_some_and(|count| *count > 0))
    }

    /// Append a message and mark the session as active now.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the session does not exist or a write
    /// fails.
    pub fn add_message(&self, message: &NewChatMessage) -> Result<ChatMessage, StoreError> {
        let now = Utc::now();
        let changes = Changes::new()
            .set("id", Uuid::new_v4())
            .set("session_id", message.session_id)
            .set("role", message.role)
            .set("content", &message.content)
            .set("created_at", now);
        let stored: ChatMessage = self.db.insert(MESSAGES, &changes)?;
        self.db.update_all(
            SESSIONS,
            &by_id(message.session_id),
            &Changes::new().set("updated_at", now),
        )?;
        Ok(stored)
    }

    /// A session's messages, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, StoreError> {
        let select = Select::from(MESSAGES)
            .filter(Filter::new().eq("session_id", session_id))
            .order_by("created_at", Direction::Ascending);
        self.db.fetch(&select)
    }
}
