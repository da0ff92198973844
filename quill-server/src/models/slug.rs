//! Post slug validation and slug generation
//!
//! Slug format: lowercase alphanumeric with hyphens/underscores

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for post slugs
pub const MAX_SLUG_LEN: usize = 200;

/// Matches DB column: VARCHAR(200), unique
static SLUG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("invalid slug regex")
});

static STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s_-]").expect("invalid strip regex"));

static DASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("invalid dash regex"));

/// Validated post slug
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostSlug(String);

impl PostSlug {
    /// Create a new slug, validating format.
    ///
    /// # Example
    /// ```
    /// use quill_server::models::PostSlug;
    ///
    /// assert!(PostSlug::new("hello-world").is_ok());
    /// assert!(PostSlug::new("Hello World").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "slug" });
        }

        if s.chars().count() > MAX_SLUG_LEN {
            return Err(ValidationError::TooLong {
                field: "slug",
                max: MAX_SLUG_LEN,
            });
        }

        if !SLUG_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "slug",
                reason: "must be lowercase alphanumeric with hyphens/underscores, starting with alphanumeric",
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a title (used when the slug is left blank).
    pub fn from_title(title: &str) -> Result<Self, ValidationError> {
        let slug = slugify(title);
        if slug.is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: "slug",
                reason: "could not be derived from title; provide one explicitly",
            });
        }
        Self::new(&slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for PostSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Convert free text to a URL-safe slug.
///
/// Lowercases, drops anything that isn't an ASCII letter, digit, space,
/// hyphen or underscore, collapses runs of whitespace/hyphens to a single
/// hyphen and trims leading/trailing hyphens and underscores. The result
/// is capped at [`MAX_SLUG_LEN`].
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = STRIP_RE.replace_all(&lowered, "");
    let dashed = DASH_RE.replace_all(stripped.trim(), "-");
    let trimmed = dashed.trim_matches(|c| c == '-' || c == '_');

    let capped: String = trimmed.chars().take(MAX_SLUG_LEN).collect();
    capped.trim_end_matches(|c| c == '-' || c == '_').to_owned()
}
