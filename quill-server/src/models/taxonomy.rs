//! Category and tag names, author usernames

use once_cell::sync::Lazy;
use regex::Regex;

use super::slug::slugify;
use super::ValidationError;

/// Maximum length for category and tag names
const MAX_LABEL_LEN: usize = 100;

/// Maximum length for author usernames
const MAX_USERNAME_LEN: usize = 150;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.@+-]+$").expect("invalid username regex"));

fn label(field: &'static str, s: &str) -> Result<String, ValidationError> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    if trimmed.chars().count() > MAX_LABEL_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_LABEL_LEN,
        });
    }

    Ok(trimmed.to_owned())
}

/// Validated category name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryName(String);

impl CategoryName {
    /// Non-empty after trimming, max 100 characters. Not required to be unique.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        label("category name", s).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated free-form tag label with its derived slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagName {
    name: String,
    slug: String,
}

impl TagName {
    /// Tags are identified by slug, so "Rust" and "rust" are the same tag.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let name = label("tag", s)?;
        let slug = slugify(&name);

        if slug.is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: "tag",
                reason: "must contain at least one letter or digit",
            });
        }

        Ok(Self { name, slug })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

/// Validated author username
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    /// Letters, digits and `@ . + - _`, max 150 characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }

        if s.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }

        if !USERNAME_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "may contain only letters, digits and @/./+/-/_",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
