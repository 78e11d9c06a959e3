//! Login and logout
//!
//! A successful login sets two cookies: `session`, the HttpOnly token the
//! server checks, and `activeSession`, a readable flag the browser client uses
//! to decide whether to show protected routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::users::UserResponse;
use crate::http::error::ApiError;
use crate::http::extractors::{ACTIVE_SESSION_COOKIE, SESSION_COOKIE};
use crate::service::{sessions, users};
use crate::state::AppState;

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn session_cookies(jar: CookieJar, token: String, secure: bool) -> CookieJar {
    let session = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);
    let flag = Cookie::build((ACTIVE_SESSION_COOKIE, "1"))
        .path("/")
        .secure(secure)
        .same_site(SameSite::Lax);
    jar.add(session).add(flag)
}

pub(crate) fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
        .remove(Cookie::build(ACTIVE_SESSION_COOKIE).path("/"))
}

/// POST /login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    let user = users::authenticate(state.store(), state.limiter(), &req.username, &req.password)
        .await?;
    let session = sessions::start(state.store(), user.id, state.config().session_ttl()).await?;
    tracing::info!(user_id = %user.id, "login");

    let jar = session_cookies(jar, session.token, state.config().secure_cookies);
    Ok((jar, Json(user.into())))
}

/// POST /logout - always succeeds, even without a session
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), ApiError> {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) {
        sessions::end(state.store(), &token).await?;
    }
    Ok((StatusCode::NO_CONTENT, clear_session_cookies(jar)))
}

/// Auth routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}
