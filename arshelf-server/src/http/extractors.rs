//! Custom Axum extractors

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::error::ApiError;
use crate::models::{User, ValidationError};
use crate::service::sessions;
use crate::state::AppState;

/// Name of the HttpOnly cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Name of the script-readable cookie the browser client checks
pub const ACTIVE_SESSION_COOKIE: &str = "activeSession";

/// The logged-in user, resolved from the session cookie.
///
/// Rejects with 401 when the cookie is missing, unknown or expired.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or_else(ApiError::unauthorized)?;

        let user = sessions::resolve(state.store(), &token)
            .await?
            .ok_or_else(ApiError::unauthorized)?;
        Ok(Self { user, token })
    }
}

pub(crate) fn parse_uuid(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field: "id",
            reason: "invalid UUID format",
        })
    })
}

/// Extract and validate a UUID from path
pub struct ValidUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidUuid
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        Ok(Self(parse_uuid(&id)?))
    }
}
