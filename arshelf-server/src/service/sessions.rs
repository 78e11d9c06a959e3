//! Login sessions
//!
//! A session is a random token stored server side. The token travels in an
//! HttpOnly cookie; expiry is checked on every lookup, and expired rows are
//! swept whenever a new session starts.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use super::ServiceResult;
use crate::db::{Store, StoreError};
use crate::models::{Session, User};

/// Token length in characters
pub const TOKEN_LEN: usize = 32;

fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Open a session for `user_id` valid for `ttl`.
pub async fn start(store: &dyn Store, user_id: Uuid, ttl: Duration) -> ServiceResult<Session> {
    let now = Utc::now();
    purge_expired(store, now).await?;
    let session = Session {
        token: new_token(),
        user_id,
        created_at: now,
        expires_at: now + ttl,
    };
    store.insert_session(&session).await?;
    tracing::debug!(%user_id, "session started");
    Ok(session)
}

/// Resolve a token to its user. Expired sessions are deleted and yield `None`.
pub async fn resolve(store: &dyn Store, token: &str) -> ServiceResult<Option<User>> {
    let Some(session) = store.get_session(token).await? else {
        return Ok(None);
    };
    if session.is_expired(Utc::now()) {
        store.delete_session(token).await?;
        tracing::debug!(user_id = %session.user_id, "session expired");
        return Ok(None);
    }
    // The user may have been removed while the cookie was still live.
    match store.get_user(session.user_id).await {
        Ok(user) => Ok(Some(user)),
        Err(StoreError::NotFound { .. }) => {
            store.delete_session(token).await?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete every session that expired at or before `now`.
pub async fn purge_expired(store: &dyn Store, now: DateTime<Utc>) -> ServiceResult<u64> {
    let purged = store.delete_expired_sessions(now).await?;
    if purged > 0 {
        tracing::debug!(purged, "expired sessions removed");
    }
    Ok(purged)
}

pub async fn end(store: &dyn Store, token: &str) -> ServiceResult<()> {
    store.delete_session(token).await?;
    Ok(())
}
