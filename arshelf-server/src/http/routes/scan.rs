//! Public barcode lookup for the AR viewer

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::models::ModelResponse;
use super::products::ProductResponse;
use crate::http::error::ApiError;
use crate::http::extractors::parse_uuid;
use crate::service::catalog;
use crate::state::AppState;

/// Scan response. `model` is null when the product has no model linked.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub product: ProductResponse,
    pub model: Option<ModelResponse>,
}

/// GET /scan/{app_id}/{barcode}
async fn scan(
    State(state): State<AppState>,
    Path((app_id, barcode)): Path<(String, String)>,
) -> Result<Json<ScanResponse>, ApiError> {
    let app_id = parse_uuid(&app_id)?;
    let result = catalog::scan(state.store(), app_id, &barcode).await?;
    Ok(Json(ScanResponse {
        product: result.product.into(),
        model: result.model.map(ModelResponse::summary),
    }))
}

/// Scan routes
pub fn router() -> Router<AppState> {
    Router::new().route("/scan/{app_id}/{barcode}", get(scan))
}
