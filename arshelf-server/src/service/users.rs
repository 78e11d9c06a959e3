//! User lifecycle
//!
//! Passwords are hashed only when the password field changes: on register,
//! and on update when a new password is supplied. A stored hash is never fed
//! back into the hasher.

use chrono::Utc;
use uuid::Uuid;

use super::{apps, Cascade, LoginLimiter, ServiceError, ServiceResult};
use crate::db::{Store, StoreError};
use crate::models::{Email, Password, PasswordHash, User, Username};

/// Registration input
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

/// Profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn parse_email(email: Option<&str>) -> ServiceResult<Option<Email>> {
    Ok(email
        .filter(|e| !e.trim().is_empty())
        .map(Email::new)
        .transpose()?)
}

/// Create an account.
pub async fn register(store: &dyn Store, input: NewUser) -> ServiceResult<User> {
    let username = Username::new(&input.username)?;
    let email = parse_email(input.email.as_deref())?;
    let password = Password::new(&input.password)?;

    // Skip the hash work for an obvious duplicate; the store still has the
    // final say through its unique constraint.
    if store.find_user(username.as_str()).await?.is_some() {
        return Err(StoreError::Conflict {
            resource: "user",
            field: "username",
        }
        .into());
    }

    let hash = PasswordHash::hash(password).await?;
    let user = User {
        id: Uuid::new_v4(),
        username: username.into_string(),
        email: email.map(Email::into_string),
        password_hash: hash.into_string(),
        created_at: Utc::now(),
    };
    store.insert_user(&user).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Apply profile changes. All fields are validated before any hashing.
pub async fn update(store: &dyn Store, user_id: Uuid, changes: UserChanges) -> ServiceResult<User> {
    let mut user = store.get_user(user_id).await?;
    let email = parse_email(changes.email.as_deref())?;
    let password = changes.password.as_deref().map(Password::new).transpose()?;

    if let Some(email) = email {
        user.email = Some(email.into_string());
    }
    if let Some(password) = password {
        user.password_hash = PasswordHash::hash(password).await?.into_string();
        tracing::info!(user_id = %user.id, "password changed");
    }

    store.update_user(&user).await?;
    Ok(user)
}

/// Check credentials, honouring the failed-login limiter.
pub async fn authenticate(
    store: &dyn Store,
    limiter: &LoginLimiter,
    username: &str,
    password: &str,
) -> ServiceResult<User> {
    let username = username.trim();
    if let Err(wait) = limiter.check(username) {
        tracing::warn!(username, "login throttled");
        return Err(ServiceError::RateLimited {
            retry_after: wait.as_secs().max(1),
        });
    }

    if let Some(user) = store.find_user(username).await? {
        if PasswordHash::from_stored(user.password_hash.as_str())
            .verify(password)
            .await?
        {
            limiter.reset(username);
            return Ok(user);
        }
    }

    limiter.record_failure(username);
    Err(ServiceError::InvalidCredentials)
}

/// Remove an account and everything it owns.
///
/// Every app owned by the user is removed with its own cascade first, then the
/// user's sessions, then the user record.
pub async fn remove(store: &dyn Store, user_id: Uuid) -> ServiceResult<Cascade> {
    store.get_user(user_id).await?;

    let mut total = Cascade::default();
    for app_id in store.app_ids_by_owner(user_id).await? {
        let removed = apps::cascade_remove(store, app_id).await.inspect_err(|e| {
            tracing::error!(%user_id, %app_id, error = %e, "user cascade interrupted");
        })?;
        total.apps += 1;
        total.models += removed.models;
        total.products += removed.products;
    }

    store.delete_sessions_by_user(user_id).await?;
    store.delete_user(user_id).await?;

    tracing::info!(
        %user_id,
        apps = total.apps,
        models = total.models,
        products = total.products,
        "user removed"
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Pagination;
    use crate::service::{apps, AppInput};
    use std::time::Duration;

    fn new_user(name: &str, password: &str) -> NewUser {
        NewUser {
            username: name.to_owned(),
            email: Some(format!("{}@example.com", name)),
            password: password.to_owned(),
        }
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let store = MemoryStore::new();
        let user = register(&store, new_user("alice", "wonderland"))
            .await
            .unwrap();

        let stored = store.get_user(user.id).await.unwrap();
        assert_ne!(stored.password_hash, "wonderland");
        assert!(stored.password_hash.starts_with("$2b$10$"));
        assert!(PasswordHash::from_stored(stored.password_hash)
            .verify("wonderland")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn short_password_rejected_before_storing() {
        let store = MemoryStore::new();
        let err = register(&store, new_user("alice", "short")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(store.find_user("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryStore::new();
        register(&store, new_user("alice", "password1")).await.unwrap();
        let err = register(&store, new_user("alice", "password2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn update_without_password_keeps_hash() {
        let store = MemoryStore::new();
        let user = register(&store, new_user("alice", "password1")).await.unwrap();

        let updated = update(
            &store,
            user.id,
            UserChanges {
                email: Some("new@example.com".into()),
                password: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.password_hash, user.password_hash);
        assert_eq!(updated.email.as_deref(), Some("new@example.com"));
    }

    #[tokio::test]
    async fn update_with_short_password_changes_nothing() {
        let store = MemoryStore::new();
        let user = register(&store, new_user("alice", "password1")).await.unwrap();

        let err = update(
            &store,
            user.id,
            UserChanges {
                email: Some("new@example.com".into()),
                password: Some("tiny".into()),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        let stored = store.get_user(user.id).await.unwrap();
        assert_eq!(stored.password_hash, user.password_hash);
        assert_eq!(stored.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn update_with_new_password_rehashes() {
        let store = MemoryStore::new();
        let user = register(&store, new_user("alice", "password1")).await.unwrap();
        let updated = update(
            &store,
            user.id,
            UserChanges {
                email: None,
                password: Some("password2".into()),
            },
        )
        .await
        .unwrap();

        assert_ne!(updated.password_hash, user.password_hash);
        let limiter = LoginLimiter::new(5, Duration::from_secs(60));
        assert!(authenticate(&store, &limiter, "alice", "password2").await.is_ok());
        assert!(authenticate(&store, &limiter, "alice", "password1").await.is_err());
    }

    #[tokio::test]
    async fn authenticate_throttles_after_failures() {
        let store = MemoryStore::new();
        register(&store, new_user("alice", "password1")).await.unwrap();
        let limiter = LoginLimiter::new(2, Duration::from_secs(60));

        for _ in 0..2 {
            let err = authenticate(&store, &limiter, "alice", "wrong-pass")
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidCredentials));
        }
        let err = authenticate(&store, &limiter, "alice", "password1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn remove_cascades_to_apps() {
        let store = MemoryStore::new();
        let user = register(&store, new_user("alice", "password1")).await.unwrap();
        let other = register(&store, new_user("bob", "password1")).await.unwrap();
        for name in ["one", "two"] {
            apps::create(
                &store,
                user.id,
                AppInput {
                    name: name.into(),
                    description: None,
                },
            )
            .await
            .unwrap();
        }
        let kept = apps::create(
            &store,
            other.id,
            AppInput {
                name: "bob's".into(),
                description: None,
            },
        )
        .await
        .unwrap();

        let report = remove(&store, user.id).await.unwrap();

        assert_eq!(report.apps, 2);
        assert!(store.get_user(user.id).await.is_err());
        assert!(store.app_ids_by_owner(user.id).await.unwrap().is_empty());
        let remaining = store.list_apps(other.id, Pagination::default()).await.unwrap();
        assert_eq!(remaining.items, vec![kept]);
    }
}
