//! Product endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::models::{Paginated, Pagination, PaginationParams, Product};
use crate::service::{catalog, ProductInput};
use crate::state::AppState;

/// Create/update product request
#[derive(Deserialize)]
pub struct ProductRequest {
    pub app_id: Uuid,
    #[serde(default)]
    pub model_id: Option<Uuid>,
    pub name: String,
    pub barcode: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ProductRequest> for ProductInput {
    fn from(req: ProductRequest) -> Self {
        Self {
            app_id: req.app_id,
            model_id: req.model_id,
            name: req.name,
            barcode: req.barcode,
            description: req.description,
        }
    }
}

/// Product response
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub app_id: Uuid,
    pub model_id: Option<Uuid>,
    pub name: String,
    pub barcode: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            app_id: p.app_id,
            model_id: p.model_id,
            name: p.name,
            barcode: p.barcode,
            description: p.description,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// GET /app/{id}/products
async fn list_products(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(app_id): ValidUuid,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ProductResponse>>, ApiError> {
    let page = Pagination::from(params);
    let result = catalog::list_products(state.store(), current.user.id, app_id, page).await?;
    Ok(Json(result.map(ProductResponse::from)))
}

/// POST /product
async fn create_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = catalog::create_product(state.store(), current.user.id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /product/{id}
async fn get_product(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = catalog::get_product(state.store(), current.user.id, id).await?;
    Ok(Json(product.into()))
}

/// PUT /product/{id}
async fn update_product(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<ProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = catalog::update_product(state.store(), current.user.id, id, req.into()).await?;
    Ok(Json(product.into()))
}

/// DELETE /product/{id}
async fn delete_product(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    catalog::remove_product(state.store(), current.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Product routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/app/{id}/products", get(list_products))
        .route("/product", post(create_product))
        .route(
            "/product/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}
