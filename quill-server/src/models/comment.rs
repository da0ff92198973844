//! Comment submission validation with basic spam heuristics

use serde::Deserialize;

use super::{FieldErrors, ValidationError};

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 80;
const MIN_BODY_LEN: usize = 10;
const MAX_LINKS: usize = 2;

/// Lowercase substrings that mark a commenter name as spam
const SPAM_KEYWORDS: &[&str] = &["spam", "viagra", "casino", "buy now"];

/// Raw comment form as submitted by a reader
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub body: String,
}

/// Comment fields that passed validation, ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub name: String,
    pub email: String,
    pub body: String,
}

impl CommentSubmission {
    /// Validate every field, reporting all failures together.
    ///
    /// Surrounding whitespace is stripped before any rule runs.
    pub fn validate(&self) -> Result<NewComment, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = errors.check(validate_name(&self.name));
        let email = errors.check(validate_email(&self.email));
        let body = errors.check(validate_body(&self.body));

        match (name, email, body) {
            (Some(name), Some(email), Some(body)) => Ok(NewComment { name, email, body }),
            _ => Err(errors),
        }
    }
}

fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();

    if name.is_empty() {
        return Err(ValidationError::Empty { field: "name" });
    }

    let len = name.chars().count();
    if len < MIN_NAME_LEN {
        return Err(ValidationError::Rejected {
            field: "name",
            message: "Name must be at least 3 characters.",
        });
    }

    if len > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name",
            max: MAX_NAME_LEN,
        });
    }

    let lowered = name.to_lowercase();
    if SPAM_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return Err(ValidationError::Rejected {
            field: "name",
            message: "Invalid name detected.",
        });
    }

    Ok(name.to_owned())
}

fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty { field: "email" });
    }

    let invalid = ValidationError::InvalidFormat {
        field: "email",
        reason: "enter a valid email address",
    };

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid);
    };

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');

    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(invalid);
    }

    Ok(email.to_owned())
}

fn validate_body(raw: &str) -> Result<String, ValidationError> {
    let body = raw.trim();

    if body.is_empty() {
        return Err(ValidationError::Empty { field: "body" });
    }

    if body.chars().count() < MIN_BODY_LEN {
        return Err(ValidationError::Rejected {
            field: "body",
            message: "Comment must be at least 10 characters.",
        });
    }

    if body.matches("http").count() > MAX_LINKS {
        return Err(ValidationError::Rejected {
            field: "body",
            message: "Too many links. Maximum 2 links allowed.",
        });
    }

    Ok(body.to_owned())
}
