//! Named views selected by an address fragment

use std::fmt;

use serde::Serialize;

/// A top-level view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Portfolio,
    Admin,
    /// Sign-in screen, shown instead of `Admin` without a session
    Auth,
    Privacy,
    Terms,
}

impl Route {
    /// Pick the view for `fragment` (with or without the leading `#`)
    ///
    /// Re-evaluate whenever the fragment or the session changes.
    pub fn resolve(fragment: &str, authenticated: bool) -> Self {
        let name = fragment.trim().trim_start_matches('#').trim_start_matches('/');
        match name.to_ascii_lowercase().as_str() {
            "admin" if authenticated => Self::Admin,
            "admin" | "auth" | "login" => Self::Auth,
            "privacy" => Self::Privacy,
            "terms" => Self::Terms,
            _ => Self::Portfolio,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portfolio => "portfolio",
            Self::Admin => "admin",
            Self::Auth => "auth",
            Self::Privacy => "privacy",
            Self::Terms => "terms",
        }
    }

    pub fn requires_session(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_is_gated() {
        assert_eq!(Route::resolve("#admin", true), Route::Admin);
        assert_eq!(Route::resolve("#admin", false), Route::Auth);
    }

    #[test]
    fn test_named_pages() {
        assert_eq!(Route::resolve("#privacy", false), Route::Privacy);
        assert_eq!(Route::resolve("terms", true), Route::Terms);
        assert_eq!(Route::resolve("#/Privacy", false), Route::Privacy);
    }

    #[test]
    fn test_anything_else_is_portfolio() {
        assert_eq!(Route::resolve("", false), Route::Portfolio);
        assert_eq!(Route::resolve("#projects", true), Route::Portfolio);
    }
}
