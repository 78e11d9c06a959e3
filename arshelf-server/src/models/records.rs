//! Stored documents
//!
//! Ownership chain: App → User, Model → App, Product → App (and optionally
//! Product → Model). Removing a parent removes its children, see
//! [`crate::service`].

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Account record. `password_hash` is a bcrypt hash, never plaintext.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A catalogue owned by one user
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct App {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A 3D model file belonging to an app
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Model {
    pub id: Uuid,
    pub app_id: Uuid,
    pub name: String,
    pub file_name: String,
    pub content_type: String,
    /// Base64 encoded file contents
    pub data: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// A scannable product belonging to an app
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub app_id: Uuid,
    pub model_id: Option<Uuid>,
    pub name: String,
    pub barcode: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Login session, addressed by its random token
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
