//! Account endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::clear_session_cookies;
use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::models::User;
use crate::service::{users, Cascade, NewUser, UserChanges};
use crate::state::AppState;

/// Register request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

/// Profile update request. Absent fields are left as they are.
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// User response; never carries the password hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// POST /user - register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = users::register(
        state.store(),
        NewUser {
            username: req.username,
            email: req.email,
            password: req.password,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /user - the logged-in user
async fn current(current: CurrentUser) -> Json<UserResponse> {
    Json(current.user.into())
}

/// PUT /user - change email and/or password
async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = users::update(
        state.store(),
        current.user.id,
        UserChanges {
            email: req.email,
            password: req.password,
        },
    )
    .await?;
    Ok(Json(user.into()))
}

/// DELETE /user - remove the account and everything it owns
async fn remove(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Cascade>), ApiError> {
    let removed = users::remove(state.store(), current.user.id).await?;
    Ok((clear_session_cookies(jar), Json(removed)))
}

/// User routes
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/user",
        get(current).post(register).put(update).delete(remove),
    )
}
