//! Validated string fields
//!
//! Usernames and barcodes are slug-like and regex checked. Display names only
//! need to be non-empty and bounded.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 32;
const MAX_EMAIL_LEN: usize = 254;
const MAX_NAME_LEN: usize = 128;
const MAX_BARCODE_LEN: usize = 64;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex")
});

/// EAN/UPC digits, Code 128 style alphanumerics
static BARCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("invalid barcode regex"));

/// Account name used to log in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// # Example
    /// ```
    /// use arshelf_server::models::Username;
    ///
    /// assert!(Username::new("shop.owner").is_ok());
    /// assert!(Username::new("ab").is_err());
    /// assert!(Username::new("has space").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }
        if s.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::TooShort {
                field: "username",
                min: MIN_USERNAME_LEN,
            });
        }
        if s.len() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }
        if !USERNAME_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "only letters, digits, '.', '_' and '-' are allowed",
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Contact address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }
        if s.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }
        if !EMAIL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "not a valid email address",
            });
        }
        Ok(Self(s.to_lowercase()))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn display_name(s: &str, field: &'static str) -> Result<String, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if s.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    Ok(s.to_owned())
}

/// Name shown for an app (and reused for 3D models)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppName(String);

impl AppName {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        display_name(s, "name").map(Self)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Name shown for a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductName(String);

impl ProductName {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        display_name(s, "product name").map(Self)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Decoded barcode value as produced by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode(String);

impl Barcode {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "barcode" });
        }
        if s.len() > MAX_BARCODE_LEN {
            return Err(ValidationError::TooLong {
                field: "barcode",
                max: MAX_BARCODE_LEN,
            });
        }
        if !BARCODE_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "barcode",
                reason: "must be alphanumeric",
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
