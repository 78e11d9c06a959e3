//! Storage abstraction
//!
//! One trait covers the four document collections and the session table.
//! The store knows nothing about ownership or cascades: those live in
//! [`crate::service`] so Postgres and the in-memory store behave identically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{App, Model, Paginated, Pagination, Product, Session, User};

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} with this {field} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
    },
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// Document storage used by the HTTP layer.
///
/// List operations return newest first. `list_models` leaves `Model::data`
/// empty; fetch a single model to get its file.
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn get_user(&self, id: Uuid) -> Result<User, StoreError>;
    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;
    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError>;

    // Apps
    async fn insert_app(&self, app: &App) -> Result<(), StoreError>;
    async fn get_app(&self, id: Uuid) -> Result<App, StoreError>;
    async fn list_apps(&self, owner_id: Uuid, page: Pagination)
        -> Result<Paginated<App>, StoreError>;
    async fn app_ids_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
    async fn update_app(&self, app: &App) -> Result<(), StoreError>;
    async fn delete_app(&self, id: Uuid) -> Result<(), StoreError>;

    // Models
    async fn insert_model(&self, model: &Model) -> Result<(), StoreError>;
    async fn get_model(&self, id: Uuid) -> Result<Model, StoreError>;
    async fn list_models(&self, app_id: Uuid, page: Pagination)
        -> Result<Paginated<Model>, StoreError>;
    async fn count_models_by_app(&self, app_id: Uuid) -> Result<i64, StoreError>;
    async fn update_model(&self, model: &Model) -> Result<(), StoreError>;
    async fn delete_model(&self, id: Uuid) -> Result<(), StoreError>;
    async fn delete_models_by_app(&self, app_id: Uuid) -> Result<u64, StoreError>;

    // Products
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;
    async fn get_product(&self, id: Uuid) -> Result<Product, StoreError>;
    async fn list_products(&self, app_id: Uuid, page: Pagination)
        -> Result<Paginated<Product>, StoreError>;
    async fn find_product_by_barcode(
        &self,
        app_id: Uuid,
        barcode: &str,
    ) -> Result<Option<Product>, StoreError>;
    async fn update_product(&self, product: &Product) -> Result<(), StoreError>;
    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError>;
    async fn delete_products_by_app(&self, app_id: Uuid) -> Result<u64, StoreError>;
    /// Unlink products from a model that is being removed.
    async fn detach_model(&self, model_id: Uuid) -> Result<u64, StoreError>;

    // Sessions
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;
    async fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError>;
    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;
    async fn delete_sessions_by_user(&self, user_id: Uuid) -> Result<u64, StoreError>;
    /// Drop every session whose `expires_at` is at or before `now`.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
