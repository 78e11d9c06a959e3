/// Structured error types for arshelf-core.
///
/// Route registration is the only fallible operation in the framework;
/// dispatch and view installation never fail.
use thiserror::Error;

/// Main error type for arshelf-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Route template could not be compiled
    #[error("Invalid route template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Compiled pattern rejected by the regex engine
    #[error("Route pattern error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for arshelf-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an invalid template error
    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_template("app/:id", "must start with '/'");
        assert_eq!(
            err.to_string(),
            "Invalid route template 'app/:id': must start with '/'"
        );
    }
}
