//! Records returned by the store and the inputs it accepts

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    effective_meta_description, MetaDescription, PostSlug, PostStatus, PostTitle, TagName,
    Username,
};

/// Post author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Post with its author, categories and tags expanded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub author: Author,
    pub body: String,
    /// Stored description; may be empty, see [`Post::meta_description`]
    pub meta_description: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub status: PostStatus,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub views: i64,
}

impl Post {
    /// Description for search engines, derived from the body when unset.
    pub fn meta_description(&self) -> String {
        effective_meta_description(&self.meta_description, &self.body)
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn has_category(&self, category_id: i64) -> bool {
        self.categories.iter().any(|c| c.id == category_id)
    }

    /// True when the two posts have at least one category in common.
    pub fn shares_category_with(&self, other: &Post) -> bool {
        self.categories.iter().any(|c| other.has_category(c.id))
    }
}

/// Reader comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
    pub created_on: DateTime<Utc>,
    /// Moderation gate: only active comments are shown publicly
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub username: Username,
    pub display_name: String,
}

/// Fields for a post insert
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: PostTitle,
    pub slug: PostSlug,
    pub author_id: i64,
    pub body: String,
    pub meta_description: MetaDescription,
    pub status: PostStatus,
    pub category_ids: Vec<i64>,
    pub tags: Vec<TagName>,
}

/// Partial post update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<PostTitle>,
    pub slug: Option<PostSlug>,
    pub body: Option<String>,
    pub meta_description: Option<MetaDescription>,
    pub status: Option<PostStatus>,
    pub category_ids: Option<Vec<i64>>,
    pub tags: Option<Vec<TagName>>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.body.is_none()
            && self.meta_description.is_none()
            && self.status.is_none()
            && self.category_ids.is_none()
            && self.tags.is_none()
    }
}

/// Post listing filter. Unset fields don't constrain.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    /// Case-insensitive substring of title OR body
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub tag_slug: Option<String>,
    /// Inclusive lower bound on `created_on`
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_on`
    pub created_to: Option<DateTime<Utc>>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Published),
            ..Self::default()
        }
    }

    /// Add a search term, matched as given; an empty term is ignored.
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search.filter(|s| !s.is_empty()).map(str::to_owned);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// In-process evaluation of the filter.
    pub fn matches(&self, post: &Post) -> bool {
        if self.status.is_some_and(|s| s != post.status) {
            return false;
        }

        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            if !post.title.to_lowercase().contains(&term)
                && !post.body.to_lowercase().contains(&term)
            {
                return false;
            }
        }

        if self.category_id.is_some_and(|id| !post.has_category(id)) {
            return false;
        }

        if let Some(slug) = &self.tag_slug {
            if !post.tags.iter().any(|t| &t.slug == slug) {
                return false;
            }
        }

        in_range(post.created_on, self.created_from, self.created_to)
    }
}

/// Comment listing filter. Unset fields don't constrain.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub post_id: Option<i64>,
    pub active: Option<bool>,
    /// Case-insensitive substring of name, email or body
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl CommentFilter {
    /// Publicly visible comments of one post.
    pub fn visible_on(post_id: i64) -> Self {
        Self {
            post_id: Some(post_id),
            active: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        if self.post_id.is_some_and(|id| id != comment.post_id) {
            return false;
        }

        if self.active.is_some_and(|a| a != comment.active) {
            return false;
        }

        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = [&comment.name, &comment.email, &comment.body]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        in_range(comment.created_on, self.created_from, self.created_to)
    }
}

fn in_range(at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.map_or(true, |from| at >= from) && to.map_or(true, |to| at < to)
}
