//! Post field validation: title, status, meta description

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Maximum length for post titles
const MAX_TITLE_LEN: usize = 200;

/// Maximum length for SEO meta descriptions
const MAX_META_DESCRIPTION_LEN: usize = 160;

/// Characters of body used when no meta description is set
const SUMMARY_LEN: usize = 150;

/// Validated post title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTitle(String);

impl PostTitle {
    /// Create a new post title.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 200 characters
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }

        if trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PostTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Publication status of a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }

    /// Parse the stored/requested form (`draft`, `published`).
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(ValidationError::InvalidVariant {
                field: "status",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated meta description (may be empty)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaDescription(String);

impl MetaDescription {
    /// Create a meta description. Empty means "derive from body".
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.chars().count() > MAX_META_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "meta_description",
                max: MAX_META_DESCRIPTION_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Meta description to publish: the explicit one, or a body summary.
///
/// A body longer than 150 characters is cut to its first 150 characters
/// followed by `...`; shorter bodies are used whole.
pub fn effective_meta_description(meta_description: &str, body: &str) -> String {
    if !meta_description.is_empty() {
        return meta_description.to_owned();
    }

    match body.char_indices().nth(SUMMARY_LEN) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_owned(),
    }
}
