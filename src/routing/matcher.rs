//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method (a GET route also answers HEAD)
//! - Match request path exactly (case-sensitive, no prefix or trailing-slash folding)
//!
//! # Design Decisions
//! - No patterns or parameters: registered routes are literal
//! - Query strings are never part of the match

use axum::http::Method;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the method and path satisfy this condition.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

/// Matches one method and one literal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactMatcher {
    method: Method,
    path: String,
}

impl ExactMatcher {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Matcher for ExactMatcher {
    fn matches(&self, method: &Method, path: &str) -> bool {
        let method_ok = *method == self.method
            || (*method == Method::HEAD && self.method == Method::GET);
        method_ok && path == self.path
    }
}
