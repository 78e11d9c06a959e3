//! App endpoints

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
use crate::models::{App, Paginated, Pagination, PaginationParams};
use crate::service::{apps, AppInput, Cascade};
use crate::state::AppState;

/// Create/update app request
#[derive(Deserialize)]
pub struct AppRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<AppRequest> for AppInput {
    fn from(req: AppRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

/// App response
#[derive(Debug, Serialize)]
pub struct AppResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<App> for AppResponse {
    fn from(a: App) -> Self {
        Self {
            id: a.id,
            name: a.name,
            description: a.description,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

/// GET /apps - the caller's apps, newest first
async fn list_apps(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<AppResponse>>, ApiError> {
    let page = Pagination::from(params);
    let result = apps::list(state.store(), current.user.id, page).await?;
    Ok(Json(result.map(AppResponse::from)))
}

/// POST /app
async fn create_app(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<AppRequest>,
) -> Result<(StatusCode, Json<AppResponse>), ApiError> {
    let app = apps::create(state.store(), current.user.id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(app.into())))
}

/// GET /app/{id}
async fn get_app(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<AppResponse>, ApiError> {
    let app = apps::owned(state.store(), current.user.id, id).await?;
    Ok(Json(app.into()))
}

/// PUT /app/{id}
async fn update_app(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<AppRequest>,
) -> Result<Json<AppResponse>, ApiError> {
    let app = apps::update(state.store(), current.user.id, id, req.into()).await?;
    Ok(Json(app.into()))
}

/// DELETE /app/{id} - removes the app's models and products too
async fn delete_app(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Cascade>, ApiError> {
    let removed = apps::remove(state.store(), current.user.id, id).await?;
    Ok(Json(removed))
}

/// App routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/apps", get(list_apps))
        .route("/app", post(create_app))
        .route("/app/{id}", get(get_app).put(update_app).delete(delete_app))
}
