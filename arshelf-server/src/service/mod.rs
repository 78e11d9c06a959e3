//! Document lifecycle: validation, password hashing, ownership and cascades
//!
//! Handlers call into this layer instead of the store directly. Cascading
//! deletes run child-first and are not transactional: if a step fails the
//! error is returned and the children already removed stay removed.

pub mod apps;
pub mod catalog;
pub mod limiter;
pub mod sessions;
pub mod users;

pub use apps::{AppInput, Cascade};
pub use catalog::{FileUpload, ModelChanges, ModelInput, ProductInput, ScanResult};
pub use limiter::LoginLimiter;
pub use users::{NewUser, UserChanges};

use crate::db::StoreError;
use crate::models::{PasswordError, ValidationError};

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("too many failed logins, retry in {retry_after} seconds")]
    RateLimited { retry_after: u64 },
}

pub type ServiceResult<T> = Result<T, ServiceError>;
