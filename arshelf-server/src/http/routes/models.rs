//! 3D model endpoints
//!
//! Lists return metadata only. `GET /model/{id}` includes the base64 payload,
//! and `GET /model/{id}/file` streams the decoded bytes to the AR viewer
//! without a login.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::models::{Model, ModelFile, Paginated, Pagination, PaginationParams};
use crate::service::{catalog, FileUpload, ModelChanges, ModelInput};
use crate::state::AppState;

/// Upload request
#[derive(Deserialize)]
pub struct CreateModelRequest {
    pub app_id: Uuid,
    pub name: String,
    pub file: FileUpload,
}

/// Update request; omit `file` to keep the current upload
#[derive(Deserialize)]
pub struct UpdateModelRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file: Option<FileUpload>,
}

/// Model response
#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub id: Uuid,
    pub app_id: Uuid,
    pub name: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Where the AR viewer downloads the file
    pub file_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub created_at: String,
}

impl ModelResponse {
    /// Metadata only
    pub fn summary(m: Model) -> Self {
        Self::build(m, false)
    }

    /// Metadata plus the base64 payload
    pub fn full(m: Model) -> Self {
        Self::build(m, true)
    }

    fn build(m: Model, with_data: bool) -> Self {
        Self {
            file_url: format!("/api/model/{}/file", m.id),
            id: m.id,
            app_id: m.app_id,
            name: m.name,
            file_name: m.file_name,
            content_type: m.content_type,
            size_bytes: m.size_bytes,
            data: with_data.then_some(m.data),
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

/// GET /app/{id}/models
async fn list_models(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(app_id): ValidUuid,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ModelResponse>>, ApiError> {
    let page = Pagination::from(params);
    let result = catalog::list_models(state.store(), current.user.id, app_id, page).await?;
    Ok(Json(result.map(ModelResponse::summary)))
}

/// POST /model
async fn create_model(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<CreateModelRequest>,
) -> Result<(StatusCode, Json<ModelResponse>), ApiError> {
    let model = catalog::create_model(
        state.store(),
        current.user.id,
        ModelInput {
            app_id: req.app_id,
            name: req.name,
            file: req.file,
        },
        state.config().max_model_bytes,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ModelResponse::summary(model))))
}

/// GET /model/{id}
async fn get_model(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ModelResponse>, ApiError> {
    let model = catalog::get_model(state.store(), current.user.id, id).await?;
    Ok(Json(ModelResponse::full(model)))
}

/// PUT /model/{id}
async fn update_model(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<UpdateModelRequest>,
) -> Result<Json<ModelResponse>, ApiError> {
    let model = catalog::update_model(
        state.store(),
        current.user.id,
        id,
        ModelChanges {
            name: req.name,
            file: req.file,
        },
        state.config().max_model_bytes,
    )
    .await?;
    Ok(Json(ModelResponse::summary(model)))
}

/// DELETE /model/{id} - linked products are kept without a model
async fn delete_model(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    catalog::remove_model(state.store(), current.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /model/{id}/file - decoded file for the AR viewer
async fn model_file(
    State(state): State<AppState>,
    ValidUuid(id): ValidUuid,
) -> Result<Response, ApiError> {
    let model = catalog::model_file(state.store(), id).await?;
    let bytes = ModelFile::decode(&model.data).ok_or_else(|| ApiError::Internal {
        message: format!("model {} has undecodable data", model.id),
    })?;

    let disposition = content_disposition(&model.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, model.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// `inline` disposition whose quoted filename is always a valid header value.
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    let safe = if safe.trim().is_empty() { "model" } else { safe.as_str() };
    format!("inline; filename=\"{safe}\"")
}

/// Model routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/app/{id}/models", get(list_models))
        .route("/model", post(create_model))
        .route(
            "/model/{id}",
            get(get_model).put(update_model).delete(delete_model),
        )
        .route("/model/{id}/file", get(model_file))
}
