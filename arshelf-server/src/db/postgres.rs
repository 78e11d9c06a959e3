//! PostgreSQL store
//!
//! Each collection is a table; see [`super::migrations`]. Uniqueness is
//! enforced by the database and unique violations are mapped to
//! [`StoreError::Conflict`] (no check-then-insert).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::store::{Store, StoreError};
use crate::models::{App, Model, Paginated, Pagination, Product, Session, User};

/// Store backed by a PgPool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn conflict(resource: &'static str, field: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::Conflict { resource, field };
            }
        }
        StoreError::Sqlx(e)
    }
}

fn expect_one(rows: u64, resource: &'static str, id: Uuid) -> Result<(), StoreError> {
    if rows == 0 {
        Err(StoreError::not_found(resource, id))
    } else {
        Ok(())
    }
}

fn paginated<T>(items: Vec<T>, total: i64, page: Pagination) -> Paginated<T> {
    Paginated {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(conflict("user", "username"))?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET username = $2, email = $3, password_hash = $4 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(conflict("user", "username"))?;
        expect_one(result.rows_affected(), "user", user.id)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "user", id)
    }

    async fn insert_app(&self, app: &App) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO apps (id, owner_id, name, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(app.id)
        .bind(app.owner_id)
        .bind(&app.name)
        .bind(&app.description)
        .bind(app.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_app(&self, id: Uuid) -> Result<App, StoreError> {
        sqlx::query_as::<_, App>("SELECT * FROM apps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("app", id))
    }

    async fn list_apps(
        &self,
        owner_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<App>, StoreError> {
        // Single query with COUNT(*) OVER() for total
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, description, created_at, COUNT(*) OVER() AS total
            FROM apps
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        let items = rows
            .into_iter()
            .map(|r| App {
                id: r.get("id"),
                owner_id: r.get("owner_id"),
                name: r.get("name"),
                description: r.get("description"),
                created_at: r.get("created_at"),
            })
            .collect();
        Ok(paginated(items, total, page))
    }

    async fn app_ids_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let ids: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM apps WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn update_app(&self, app: &App) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE apps SET name = $2, description = $3 WHERE id = $1")
            .bind(app.id)
            .bind(&app.name)
            .bind(&app.description)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "app", app.id)
    }

    async fn delete_app(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM apps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "app", id)
    }

    async fn insert_model(&self, model: &Model) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO models (id, app_id, name, file_name, content_type, data, size_bytes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(model.id)
        .bind(model.app_id)
        .bind(&model.name)
        .bind(&model.file_name)
        .bind(&model.content_type)
        .bind(&model.data)
        .bind(model.size_bytes)
        .bind(model.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_model(&self, id: Uuid) -> Result<Model, StoreError> {
        sqlx::query_as::<_, Model>("SELECT * FROM models WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("model", id))
    }

    async fn list_models(
        &self,
        app_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<Model>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, app_id, name, file_name, content_type, size_bytes, created_at,
                   COUNT(*) OVER() AS total
            FROM models
            WHERE app_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(app_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        let items = rows
            .into_iter()
            .map(|r| Model {
                id: r.get("id"),
                app_id: r.get("app_id"),
                name: r.get("name"),
                file_name: r.get("file_name"),
                content_type: r.get("content_type"),
                data: String::new(),
                size_bytes: r.get("size_bytes"),
                created_at: r.get("created_at"),
            })
            .collect();
        Ok(paginated(items, total, page))
    }

    async fn count_models_by_app(&self, app_id: Uuid) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM models WHERE app_id = $1")
            .bind(app_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn update_model(&self, model: &Model) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE models
            SET name = $2, file_name = $3, content_type = $4, data = $5, size_bytes = $6
            WHERE id = $1
            "#,
        )
        .bind(model.id)
        .bind(&model.name)
        .bind(&model.file_name)
        .bind(&model.content_type)
        .bind(&model.data)
        .bind(model.size_bytes)
        .execute(&self.pool)
        .await?;
        expect_one(result.rows_affected(), "model", model.id)
    }

    async fn delete_model(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM models WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "model", id)
    }

    async fn delete_models_by_app(&self, app_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM models WHERE app_id = $1")
            .bind(app_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, app_id, model_id, name, barcode, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id)
        .bind(product.app_id)
        .bind(product.model_id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(&product.description)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(conflict("product", "barcode"))?;
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> Result<Product, StoreError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn list_products(
        &self,
        app_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, app_id, model_id, name, barcode, description, created_at,
                   COUNT(*) OVER() AS total
            FROM products
            WHERE app_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(app_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        let items = rows
            .into_iter()
            .map(|r| Product {
                id: r.get("id"),
                app_id: r.get("app_id"),
                model_id: r.get("model_id"),
                name: r.get("name"),
                barcode: r.get("barcode"),
                description: r.get("description"),
                created_at: r.get("created_at"),
            })
            .collect();
        Ok(paginated(items, total, page))
    }

    async fn find_product_by_barcode(
        &self,
        app_id: Uuid,
        barcode: &str,
    ) -> Result<Option<Product>, StoreError> {
        Ok(sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE app_id = $1 AND barcode = $2",
        )
        .bind(app_id)
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET model_id = $2, name = $3, barcode = $4, description = $5
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(product.model_id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(&product.description)
        .execute(&self.pool)
        .await
        .map_err(conflict("product", "barcode"))?;
        expect_one(result.rows_affected(), "product", product.id)
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "product", id)
    }

    async fn delete_products_by_app(&self, app_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE app_id = $1")
            .bind(app_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn detach_model(&self, model_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE products SET model_id = NULL WHERE model_id = $1")
            .bind(model_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(
            sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_sessions_by_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};
    use chrono::Utc;

    // Integration tests - run with DATABASE_URL set
    // cargo test -p arshelf-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn user_roundtrip_and_conflict() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations failed");
        let store = PgStore::new(pool);

        let user = User {
            id: Uuid::new_v4(),
            username: format!("it-{}", Uuid::new_v4().simple()),
            email: None,
            password_hash: "$2b$10$placeholder".into(),
            created_at: Utc::now(),
        };
        store.insert_user(&user).await.unwrap();
        let loaded = store.find_user(&user.username).await.unwrap().unwrap();
        assert_eq!(loaded.id, user.id);

        let dup = User {
            id: Uuid::new_v4(),
            ..user.clone()
        };
        assert!(matches!(
            store.insert_user(&dup).await,
            Err(StoreError::Conflict { .. })
        ));
        store.delete_user(user.id).await.unwrap();
    }
}
