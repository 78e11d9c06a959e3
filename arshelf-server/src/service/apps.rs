//! App lifecycle and the app-level cascade

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::ServiceResult;
use crate::db::{Store, StoreError};
use crate::models::{App, AppName, Paginated, Pagination};

/// App create/update input
#[derive(Debug, Clone)]
pub struct AppInput {
    pub name: String,
    pub description: Option<String>,
}

/// Counts of documents removed by a cascade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Cascade {
    pub apps: u64,
    pub models: u64,
    pub products: u64,
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
}

pub async fn create(store: &dyn Store, owner_id: Uuid, input: AppInput) -> ServiceResult<App> {
    let name = AppName::new(&input.name)?;
    let app = App {
        id: Uuid::new_v4(),
        owner_id,
        name: name.into_string(),
        description: clean_description(input.description),
        created_at: Utc::now(),
    };
    store.insert_app(&app).await?;
    tracing::info!(app_id = %app.id, %owner_id, "app created");
    Ok(app)
}

/// Load an app, treating apps of other users as missing.
pub async fn owned(store: &dyn Store, owner_id: Uuid, app_id: Uuid) -> ServiceResult<App> {
    let app = store.get_app(app_id).await?;
    if app.owner_id != owner_id {
        return Err(StoreError::not_found("app", app_id).into());
    }
    Ok(app)
}

pub async fn list(
    store: &dyn Store,
    owner_id: Uuid,
    page: Pagination,
) -> ServiceResult<Paginated<App>> {
    Ok(store.list_apps(owner_id, page).await?)
}

pub async fn update(
    store: &dyn Store,
    owner_id: Uuid,
    app_id: Uuid,
    input: AppInput,
) -> ServiceResult<App> {
    let name = AppName::new(&input.name)?;
    let mut app = owned(store, owner_id, app_id).await?;
    app.name = name.into_string();
    app.description = clean_description(input.description);
    store.update_app(&app).await?;
    Ok(app)
}

/// Remove an owned app with its models and products.
pub async fn remove(store: &dyn Store, owner_id: Uuid, app_id: Uuid) -> ServiceResult<Cascade> {
    owned(store, owner_id, app_id).await?;
    cascade_remove(store, app_id).await
}

/// Delete every product and model referencing `app_id`, then the app.
///
/// Products go first because they may point at models.
pub(crate) async fn cascade_remove(store: &dyn Store, app_id: Uuid) -> ServiceResult<Cascade> {
    let products = store.delete_products_by_app(app_id).await?;
    let models = store.delete_models_by_app(app_id).await?;
    store.delete_app(app_id).await?;

    tracing::info!(%app_id, models, products, "app removed");
    Ok(Cascade {
        apps: 1,
        models,
        products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::service::{catalog, FileUpload, ModelInput, ProductInput, ServiceError};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn input(name: &str) -> AppInput {
        AppInput {
            name: name.to_owned(),
            description: Some("  ".to_owned()),
        }
    }

    fn upload() -> FileUpload {
        FileUpload {
            name: "chair.glb".into(),
            content_type: String::new(),
            data: STANDARD.encode(b"glTF-binary"),
        }
    }

    #[tokio::test]
    async fn create_validates_and_trims() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let app = create(&store, owner, input(" Spring ")).await.unwrap();
        assert_eq!(app.name, "Spring");
        assert_eq!(app.description, None);

        let err = create(&store, owner, input("")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn other_owner_sees_not_found() {
        let store = MemoryStore::new();
        let app = create(&store, Uuid::new_v4(), input("mine")).await.unwrap();
        let err = owned(&store, Uuid::new_v4(), app.id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::NotFound { .. })
        ));
        assert!(remove(&store, Uuid::new_v4(), app.id).await.is_err());
        assert!(store.get_app(app.id).await.is_ok());
    }

    #[tokio::test]
    async fn removing_app_leaves_no_models_behind() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let app = create(&store, owner, input("shop")).await.unwrap();
        let sibling = create(&store, owner, input("other")).await.unwrap();

        for target in [app.id, app.id, sibling.id] {
            let model = catalog::create_model(
                &store,
                owner,
                ModelInput {
                    app_id: target,
                    name: "Chair".into(),
                    file: upload(),
                },
                1024,
            )
            .await
            .unwrap();
            catalog::create_product(
                &store,
                owner,
                ProductInput {
                    app_id: target,
                    model_id: Some(model.id),
                    name: "Chair".into(),
                    barcode: format!("B{}", model.id.simple()),
                    description: None,
                },
            )
            .await
            .unwrap();
        }

        let report = remove(&store, owner, app.id).await.unwrap();

        assert_eq!(report.models, 2);
        assert_eq!(report.products, 2);
        assert_eq!(store.count_models_by_app(app.id).await.unwrap(), 0);
        assert_eq!(store.count_models_by_app(sibling.id).await.unwrap(), 1);
        assert!(store.get_app(app.id).await.is_err());
    }
}
