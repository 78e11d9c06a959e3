//! In-memory store
//!
//! Backs the test suite and `serve --memory`. Mirrors the Postgres
//! constraints: unique usernames and unique barcodes per app.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{Store, StoreError};
use crate::models::{App, Model, Paginated, Pagination, Product, Session, User};

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    apps: HashMap<Uuid, App>,
    models: HashMap<Uuid, Model>,
    products: HashMap<Uuid, Product>,
    sessions: HashMap<String, Session>,
}

/// Store kept entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, id as tie-break so pages are stable.
fn newest_first<T: Clone>(
    items: impl Iterator<Item = T>,
    key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, Uuid),
    page: Pagination,
) -> Paginated<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    page.apply(&items)
}

fn replace<T: Clone>(
    map: &mut HashMap<Uuid, T>,
    id: Uuid,
    value: &T,
    resource: &'static str,
) -> Result<(), StoreError> {
    match map.get_mut(&id) {
        Some(slot) => {
            *slot = value.clone();
            Ok(())
        }
        None => Err(StoreError::not_found(resource, id)),
    }
}

fn barcode_taken(products: &HashMap<Uuid, Product>, candidate: &Product) -> bool {
    products.values().any(|p| {
        p.id != candidate.id && p.app_id == candidate.app_id && p.barcode == candidate.barcode
    })
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict {
                resource: "user",
                field: "username",
            });
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        self.inner
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        replace(&mut inner.users, user.id, user, "user")
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn insert_app(&self, app: &App) -> Result<(), StoreError> {
        self.inner.write().await.apps.insert(app.id, app.clone());
        Ok(())
    }

    async fn get_app(&self, id: Uuid) -> Result<App, StoreError> {
        self.inner
            .read()
            .await
            .apps
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("app", id))
    }

    async fn list_apps(
        &self,
        owner_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<App>, StoreError> {
        let inner = self.inner.read().await;
        Ok(newest_first(
            inner.apps.values().filter(|a| a.owner_id == owner_id).cloned(),
            |a| (a.created_at, a.id),
            page,
        ))
    }

    async fn app_ids_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .apps
            .values()
            .filter(|a| a.owner_id == owner_id)
            .map(|a| a.id)
            .collect())
    }

    async fn update_app(&self, app: &App) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        replace(&mut inner.apps, app.id, app, "app")
    }

    async fn delete_app(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .apps
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("app", id))
    }

    async fn insert_model(&self, model: &Model) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .models
            .insert(model.id, model.clone());
        Ok(())
    }

    async fn get_model(&self, id: Uuid) -> Result<Model, StoreError> {
        self.inner
            .read()
            .await
            .models
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("model", id))
    }

    async fn list_models(
        &self,
        app_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<Model>, StoreError> {
        let inner = self.inner.read().await;
        let listed = newest_first(
            inner.models.values().filter(|m| m.app_id == app_id).cloned(),
            |m| (m.created_at, m.id),
            page,
        );
        Ok(listed.map(|mut m| {
            m.data.clear();
            m
        }))
    }

    async fn count_models_by_app(&self, app_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.models.values().filter(|m| m.app_id == app_id).count() as i64)
    }

    async fn update_model(&self, model: &Model) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        replace(&mut inner.models, model.id, model, "model")
    }

    async fn delete_model(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .models
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("model", id))
    }

    async fn delete_models_by_app(&self, app_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.models.len();
        inner.models.retain(|_, m| m.app_id != app_id);
        Ok((before - inner.models.len()) as u64)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if barcode_taken(&inner.products, product) {
            return Err(StoreError::Conflict {
                resource: "product",
                field: "barcode",
            });
        }
        inner.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> Result<Product, StoreError> {
        self.inner
            .read()
            .await
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn list_products(
        &self,
        app_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<Product>, StoreError> {
        let inner = self.inner.read().await;
        Ok(newest_first(
            inner.products.values().filter(|p| p.app_id == app_id).cloned(),
            |p| (p.created_at, p.id),
            page,
        ))
    }

    async fn find_product_by_barcode(
        &self,
        app_id: Uuid,
        barcode: &str,
    ) -> Result<Option<Product>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .products
            .values()
            .find(|p| p.app_id == app_id && p.barcode == barcode)
            .cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if barcode_taken(&inner.products, product) {
            return Err(StoreError::Conflict {
                resource: "product",
                field: "barcode",
            });
        }
        replace(&mut inner.products, product.id, product, "product")
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn delete_products_by_app(&self, app_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.products.len();
        inner.products.retain(|_, p| p.app_id != app_id);
        Ok((before - inner.products.len()) as u64)
    }

    async fn detach_model(&self, model_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let mut detached = 0;
        for product in inner.products.values_mut() {
            if product.model_id == Some(model_id) {
                product.model_id = None;
                detached += 1;
            }
        }
        Ok(detached)
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.inner.read().await.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.inner.write().await.sessions.remove(token);
        Ok(())
    }

    async fn delete_sessions_by_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - inner.sessions.len()) as u64)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - inner.sessions.len()) as u64)
    }
}
