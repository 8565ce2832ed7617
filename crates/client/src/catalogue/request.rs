//! Catalogue API request types and validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::CatalogueError;

/// Longest search term sent to the catalogue.
const MAX_QUERY_CHARS: usize = 400;

/// Category slugs are lowercase words joined by single hyphens (`mens-shirts`).
static SLUG_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").ok());

/// Query string for `GET /products/search`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(term: &str, limit: u32) -> Self {
        Self { q: term.trim().to_string(), limit }
    }

    /// Validate the search parameters.
    ///
    /// Returns an error if the term is empty or too long, or the limit is 0.
    pub fn validate(&self) -> Result<(), CatalogueError> {
        if self.q.is_empty() {
            return Err(CatalogueError::InvalidRequest("search term cannot be empty".to_string()));
        }

        let chars = self.q.chars().count();
        if chars > MAX_QUERY_CHARS {
            return Err(CatalogueError::InvalidRequest(format!(
                "search term too long: {chars} chars (max {MAX_QUERY_CHARS})"
            )));
        }

        if self.limit == 0 {
            return Err(CatalogueError::InvalidRequest("search limit must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Validate a category slug before it becomes a path segment.
pub fn validate_slug(slug: &str) -> Result<(), CatalogueError> {
    if slug.is_empty() {
        return Err(CatalogueError::InvalidRequest("category slug cannot be empty".to_string()));
    }
    if !SLUG_PATTERN.as_ref().is_some_and(|re| re.is_match(slug)) {
        return Err(CatalogueError::InvalidRequest(format!("malformed category slug: {slug}")));
    }
    Ok(())
}

pub fn validate_id(id: u64) -> Result<(), CatalogueError> {
    if id == 0 {
        return Err(CatalogueError::InvalidRequest("product id must be at least 1".to_string()));
    }
    Ok(())
}
