//! Models and products inside an app
//!
//! Every operation that takes an owner checks it through the parent app, so a
//! record in someone else's app looks exactly like a missing one. Barcode
//! scans are the one public read.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{apps, ServiceError, ServiceResult};
use crate::db::{Store, StoreError};
use crate::models::{
    AppName, Barcode, Model, ModelFile, Paginated, Pagination, Product, ProductName,
};

/// File input as submitted by the admin form
#[derive(Debug, Clone, Deserialize)]
pub struct FileUpload {
    pub name: String,
    #[serde(default)]
    pub content_type: String,
    /// Base64 payload, optionally as a data URL
    pub data: String,
}

impl FileUpload {
    fn validate(&self, max_bytes: usize) -> ServiceResult<ModelFile> {
        Ok(ModelFile::new(
            &self.name,
            &self.content_type,
            &self.data,
            max_bytes,
        )?)
    }
}

#[derive(Debug, Clone)]
pub struct ModelInput {
    pub app_id: Uuid,
    pub name: String,
    pub file: FileUpload,
}

/// Model update; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct ModelChanges {
    pub name: Option<String>,
    pub file: Option<FileUpload>,
}

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub app_id: Uuid,
    pub model_id: Option<Uuid>,
    pub name: String,
    pub barcode: String,
    pub description: Option<String>,
}

/// What the AR viewer receives for a scanned barcode
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub product: Product,
    pub model: Option<Model>,
}

fn apply_file(model: &mut Model, file: ModelFile) {
    model.file_name = file.file_name;
    model.content_type = file.content_type;
    model.data = file.data;
    model.size_bytes = file.size as i64;
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

pub async fn create_model(
    store: &dyn Store,
    owner_id: Uuid,
    input: ModelInput,
    max_bytes: usize,
) -> ServiceResult<Model> {
    let name = AppName::new(&input.name)?;
    let file = input.file.validate(max_bytes)?;
    apps::owned(store, owner_id, input.app_id).await?;

    let mut model = Model {
        id: Uuid::new_v4(),
        app_id: input.app_id,
        name: name.into_string(),
        file_name: String::new(),
        content_type: String::new(),
        data: String::new(),
        size_bytes: 0,
        created_at: Utc::now(),
    };
    apply_file(&mut model, file);
    store.insert_model(&model).await?;

    tracing::info!(model_id = %model.id, app_id = %model.app_id, size = model.size_bytes, "model uploaded");
    Ok(model)
}

/// A missing or foreign parent app reports the child as missing. Any other
/// failure passes through untouched.
fn hide_parent(err: ServiceError, resource: &'static str, id: Uuid) -> ServiceError {
    match err {
        ServiceError::Store(StoreError::NotFound { .. }) => StoreError::not_found(resource, id).into(),
        other => other,
    }
}

/// Load a model in one of `owner_id`'s apps.
pub async fn get_model(store: &dyn Store, owner_id: Uuid, model_id: Uuid) -> ServiceResult<Model> {
    let model = store.get_model(model_id).await?;
    apps::owned(store, owner_id, model.app_id)
        .await
        .map_err(|e| hide_parent(e, "model", model_id))?;
    Ok(model)
}

/// Load a model file without an owner check, for the AR viewer.
pub async fn model_file(store: &dyn Store, model_id: Uuid) -> ServiceResult<Model> {
    Ok(store.get_model(model_id).await?)
}

pub async fn list_models(
    store: &dyn Store,
    owner_id: Uuid,
    app_id: Uuid,
    page: Pagination,
) -> ServiceResult<Paginated<Model>> {
    apps::owned(store, owner_id, app_id).await?;
    Ok(store.list_models(app_id, page).await?)
}

pub async fn update_model(
    store: &dyn Store,
    owner_id: Uuid,
    model_id: Uuid,
    changes: ModelChanges,
    max_bytes: usize,
) -> ServiceResult<Model> {
    let name = changes.name.as_deref().map(AppName::new).transpose()?;
    let file = changes
        .file
        .as_ref()
        .map(|f| f.validate(max_bytes))
        .transpose()?;

    let mut model = get_model(store, owner_id, model_id).await?;
    if let Some(name) = name {
        model.name = name.into_string();
    }
    if let Some(file) = file {
        apply_file(&mut model, file);
    }
    store.update_model(&model).await?;
    Ok(model)
}

/// Remove a model. Products that displayed it are kept but unlinked.
///
/// Returns the number of products unlinked.
pub async fn remove_model(store: &dyn Store, owner_id: Uuid, model_id: Uuid) -> ServiceResult<u64> {
    get_model(store, owner_id, model_id).await?;
    let detached = store.detach_model(model_id).await?;
    store.delete_model(model_id).await?;

    tracing::info!(%model_id, detached, "model removed");
    Ok(detached)
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Build a product from input, checking the app and linked model.
async fn prepare_product(
    store: &dyn Store,
    owner_id: Uuid,
    input: ProductInput,
) -> ServiceResult<(ProductName, Barcode, ProductInput)> {
    let name = ProductName::new(&input.name)?;
    let barcode = Barcode::new(&input.barcode)?;
    apps::owned(store, owner_id, input.app_id).await?;

    if let Some(model_id) = input.model_id {
        let model = store.get_model(model_id).await?;
        if model.app_id != input.app_id {
            return Err(StoreError::not_found("model", model_id).into());
        }
    }
    Ok((name, barcode, input))
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
}

pub async fn create_product(
    store: &dyn Store,
    owner_id: Uuid,
    input: ProductInput,
) -> ServiceResult<Product> {
    let (name, barcode, input) = prepare_product(store, owner_id, input).await?;
    let product = Product {
        id: Uuid::new_v4(),
        app_id: input.app_id,
        model_id: input.model_id,
        name: name.into_string(),
        barcode: barcode.into_string(),
        description: clean_description(input.description),
        created_at: Utc::now(),
    };
    store.insert_product(&product).await?;

    tracing::info!(product_id = %product.id, app_id = %product.app_id, barcode = %product.barcode, "product created");
    Ok(product)
}

pub async fn get_product(
    store: &dyn Store,
    owner_id: Uuid,
    product_id: Uuid,
) -> ServiceResult<Product> {
    let product = store.get_product(product_id).await?;
    apps::owned(store, owner_id, product.app_id)
        .await
        .map_err(|e| hide_parent(e, "product", product_id))?;
    Ok(product)
}

pub async fn list_products(
    store: &dyn Store,
    owner_id: Uuid,
    app_id: Uuid,
    page: Pagination,
) -> ServiceResult<Paginated<Product>> {
    apps::owned(store, owner_id, app_id).await?;
    Ok(store.list_products(app_id, page).await?)
}

/// Replace a product's fields. Moving it to another app requires owning both.
pub async fn update_product(
    store: &dyn Store,
    owner_id: Uuid,
    product_id: Uuid,
    input: ProductInput,
) -> ServiceResult<Product> {
    let mut product = get_product(store, owner_id, product_id).await?;
    let (name, barcode, input) = prepare_product(store, owner_id, input).await?;

    product.app_id = input.app_id;
    product.model_id = input.model_id;
    product.name = name.into_string();
    product.barcode = barcode.into_string();
    product.description = clean_description(input.description);
    store.update_product(&product).await?;
    Ok(product)
}

pub async fn remove_product(
    store: &dyn Store,
    owner_id: Uuid,
    product_id: Uuid,
) -> ServiceResult<()> {
    get_product(store, owner_id, product_id).await?;
    store.delete_product(product_id).await?;
    tracing::info!(%product_id, "product removed");
    Ok(())
}

/// Look up a barcode inside an app, with the linked model if any.
pub async fn scan(store: &dyn Store, app_id: Uuid, barcode: &str) -> ServiceResult<ScanResult> {
    let barcode = Barcode::new(barcode)?;
    let product = store
        .find_product_by_barcode(app_id, barcode.as_str())
        .await?
        .ok_or_else(|| StoreError::not_found("product", barcode.as_str()))?;

    let model = match product.model_id {
        // A dangling link is reported as "no model" rather than failing the scan.
        Some(model_id) => match store.get_model(model_id).await {
            Ok(model) => Some(model),
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    tracing::debug!(%app_id, barcode = %product.barcode, has_model = model.is_some(), "barcode scanned");
    Ok(ScanResult { product, model })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::service::AppInput;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    const MAX: usize = 1024;

    #[test]
    fn parent_lookup_failures_keep_their_kind() {
        let id = Uuid::new_v4();
        let hidden = hide_parent(StoreError::not_found("app", Uuid::new_v4()).into(), "model", id);
        assert!(matches!(
            hidden,
            ServiceError::Store(StoreError::NotFound { resource: "model", .. })
        ));

        let outage = hide_parent(StoreError::Sqlx(sqlx::Error::PoolClosed).into(), "product", id);
        assert!(matches!(outage, ServiceError::Store(StoreError::Sqlx(_))));
    }

    async fn setup(store: &MemoryStore) -> (Uuid, Uuid) {
        let owner = Uuid::new_v4();
        let app = apps::create(
            store,
            owner,
            AppInput {
                name: "Furniture".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        (owner, app.id)
    }

    fn upload(bytes: &[u8]) -> FileUpload {
        FileUpload {
            name: "chair.glb".into(),
            content_type: String::new(),
            data: STANDARD.encode(bytes),
        }
    }

    fn product(app_id: Uuid, model_id: Option<Uuid>, barcode: &str) -> ProductInput {
        ProductInput {
            app_id,
            model_id,
            name: "Chair".into(),
            barcode: barcode.into(),
            description: Some("oak".into()),
        }
    }

    async fn model(store: &MemoryStore, owner: Uuid, app_id: Uuid) -> Model {
        create_model(
            store,
            owner,
            ModelInput {
                app_id,
                name: "Chair".into(),
                file: upload(b"glTF"),
            },
            MAX,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn model_upload_validates_file() {
        let store = MemoryStore::new();
        let (owner, app_id) = setup(&store).await;

        let created = model(&store, owner, app_id).await;
        assert_eq!(created.size_bytes, 4);
        assert_eq!(created.content_type, "model/gltf-binary");

        let err = create_model(
            &store,
            owner,
            ModelInput {
                app_id,
                name: "Huge".into(),
                file: upload(&[0u8; 2048]),
            },
            MAX,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn models_in_foreign_apps_are_invisible() {
        let store = MemoryStore::new();
        let (owner, app_id) = setup(&store).await;
        let created = model(&store, owner, app_id).await;

        let stranger = Uuid::new_v4();
        assert!(get_model(&store, stranger, created.id).await.is_err());
        assert!(remove_model(&store, stranger, created.id).await.is_err());
        assert!(model_file(&store, created.id).await.is_ok());
    }

    #[tokio::test]
    async fn update_model_keeps_file_when_only_renamed() {
        let store = MemoryStore::new();
        let (owner, app_id) = setup(&store).await;
        let created = model(&store, owner, app_id).await;

        let updated = update_model(
            &store,
            owner,
            created.id,
            ModelChanges {
                name: Some("Stool".into()),
                file: None,
            },
            MAX,
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Stool");
        assert_eq!(updated.data, created.data);
    }

    #[tokio::test]
    async fn removing_model_unlinks_products() {
        let store = MemoryStore::new();
        let (owner, app_id) = setup(&store).await;
        let created = model(&store, owner, app_id).await;
        let p = create_product(&store, owner, product(app_id, Some(created.id), "123"))
            .await
            .unwrap();

        assert_eq!(remove_model(&store, owner, created.id).await.unwrap(), 1);
        let kept = store.get_product(p.id).await.unwrap();
        assert_eq!(kept.model_id, None);
    }

    #[tokio::test]
    async fn product_cannot_link_model_from_other_app() {
        let store = MemoryStore::new();
        let (owner, app_id) = setup(&store).await;
        let other = apps::create(
            &store,
            owner,
            AppInput {
                name: "Other".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        let foreign = model(&store, owner, other.id).await;

        let err = create_product(&store, owner, product(app_id, Some(foreign.id), "1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_barcode_conflicts_within_app() {
        let store = MemoryStore::new();
        let (owner, app_id) = setup(&store).await;
        create_product(&store, owner, product(app_id, None, "ABC-1"))
            .await
            .unwrap();
        let err = create_product(&store, owner, product(app_id, None, "ABC-1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn scan_returns_product_and_model() {
        let store = MemoryStore::new();
        let (owner, app_id) = setup(&store).await;
        let created = model(&store, owner, app_id).await;
        create_product(&store, owner, product(app_id, Some(created.id), "4006381333931"))
            .await
            .unwrap();

        let result = scan(&store, app_id, "4006381333931").await.unwrap();
        assert_eq!(result.product.name, "Chair");
        assert_eq!(result.model.map(|m| m.id), Some(created.id));

        assert!(scan(&store, app_id, "0000").await.is_err());
        assert!(scan(&store, Uuid::new_v4(), "4006381333931").await.is_err());
    }

    #[tokio::test]
    async fn update_product_revalidates() {
        let store = MemoryStore::new();
        let (owner, app_id) = setup(&store).await;
        let p = create_product(&store, owner, product(app_id, None, "1"))
            .await
            .unwrap();

        let err = update_product(&store, owner, p.id, product(app_id, None, "not valid!"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut input = product(app_id, None, "2");
        input.description = None;
        let updated = update_product(&store, owner, p.id, input).await.unwrap();
        assert_eq!(updated.barcode, "2");
        assert_eq!(updated.description, None);
    }
}
