//! Login cookie heuristic
//!
//! The server sets a readable `activeSession` flag next to its HttpOnly
//! session cookie (older deployments used `xsrfToken`). The client only reads
//! the flag to decide which screens to offer.

use std::collections::HashMap;

/// Cookie names that indicate a logged-in browser
pub const SESSION_COOKIES: [&str; 2] = ["xsrfToken", "activeSession"];

/// Parsed view of a `Cookie` header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFlag {
    cookies: HashMap<String, String>,
}

impl SessionFlag {
    /// Parse `name=value; other=value` pairs. Malformed pairs are ignored.
    pub fn from_cookie_header(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
            .filter(|(name, _)| !name.is_empty())
            .collect();
        Self { cookies }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// True when any session cookie carries a non-empty value.
    pub fn is_logged_in(&self) -> bool {
        SESSION_COOKIES
            .iter()
            .any(|name| self.cookie(name).is_some_and(|v| !v.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_active_session() {
        let flag = SessionFlag::from_cookie_header("theme=dark; activeSession=1");
        assert!(flag.is_logged_in());
        assert_eq!(flag.cookie("theme"), Some("dark"));
    }

    #[test]
    fn detects_legacy_xsrf_token() {
        assert!(SessionFlag::from_cookie_header("xsrfToken=abc").is_logged_in());
    }

    #[test]
    fn empty_value_is_logged_out() {
        assert!(!SessionFlag::from_cookie_header("activeSession=").is_logged_in());
        assert!(!SessionFlag::from_cookie_header("").is_logged_in());
        assert!(!SessionFlag::from_cookie_header("garbage; ;=x").is_logged_in());
    }
}
