//! Administrative CRUD over authors, categories, posts and comments
//!
//! Inputs arrive as loosely typed drafts/patches (what a form or JSON body
//! carries) and are validated into store inputs, collecting every field
//! error before anything is written.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{
    CategoryName, FieldErrors, MetaDescription, Paginated, Pagination, PaginationParams,
    PostSlug, PostStatus, PostTitle, TagName, Username, ValidationError,
};
use crate::moderation::Moderation;
use crate::store::{
    Author, Category, Comment, CommentFilter, ContentStore, NewAuthor, NewPost, Post,
    PostChanges, PostFilter, Tag,
};
use crate::Result;

/// Page size for admin post lists when none is requested
const ADMIN_PER_PAGE: u32 = 25;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorDraft {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
}

/// New post as entered by an editor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostDraft {
    pub title: String,
    /// Derived from the title when absent or blank
    pub slug: Option<String>,
    pub author_id: i64,
    pub body: String,
    pub meta_description: String,
    pub status: PostStatus,
    pub categories: Vec<i64>,
    pub tags: Vec<String>,
}

impl PostDraft {
    pub fn validate(&self) -> std::result::Result<NewPost, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = errors.check(PostTitle::new(&self.title));
        let slug = match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => errors.check(PostSlug::new(slug)),
            None => errors.check(PostSlug::from_title(&self.title)),
        };
        let body = errors.check(validate_body(&self.body));
        let meta_description = errors.check(MetaDescription::new(&self.meta_description));
        let tags = errors.check(validate_tags(&self.tags));

        match (title, slug, body, meta_description, tags) {
            (Some(title), Some(slug), Some(body), Some(meta_description), Some(tags)) => {
                Ok(NewPost {
                    title,
                    slug,
                    author_id: self.author_id,
                    body,
                    meta_description,
                    status: self.status,
                    category_ids: self.categories.clone(),
                    tags,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Partial post edit; absent fields are left as they are
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub meta_description: Option<String>,
    pub status: Option<PostStatus>,
    pub categories: Option<Vec<i64>>,
    pub tags: Option<Vec<String>>,
}

impl PostPatch {
    pub fn validate(&self) -> std::result::Result<PostChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut changes = PostChanges {
            status: self.status,
            category_ids: self.categories.clone(),
            ..PostChanges::default()
        };

        if let Some(title) = &self.title {
            changes.title = errors.check(PostTitle::new(title));
        }
        if let Some(slug) = &self.slug {
            changes.slug = errors.check(PostSlug::new(slug.trim()));
        }
        if let Some(body) = &self.body {
            changes.body = errors.check(validate_body(body));
        }
        if let Some(meta) = &self.meta_description {
            changes.meta_description = errors.check(MetaDescription::new(meta));
        }
        if let Some(tags) = &self.tags {
            changes.tags = errors.check(validate_tags(tags));
        }

        errors.into_result().map(|()| changes)
    }
}

/// Filters of the admin post list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostListQuery {
    pub status: Option<PostStatus>,
    pub category: Option<i64>,
    /// Tag slug
    pub tag: Option<String>,
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub page: Option<String>,
    pub per_page: Option<u32>,
}

impl PostListQuery {
    pub fn filter(&self) -> PostFilter {
        PostFilter {
            status: self.status,
            category_id: self.category,
            tag_slug: self.tag.clone().filter(|t| !t.is_empty()),
            created_from: self.created_from,
            created_to: self.created_to,
            ..PostFilter::default()
        }
        .with_search(self.search.as_deref().map(str::trim))
    }

    pub fn pagination(&self) -> Pagination {
        PaginationParams {
            page: self.page.clone(),
            per_page: self.per_page,
        }
        .resolve(ADMIN_PER_PAGE)
    }
}

/// Filters of the admin comment list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentListQuery {
    pub post: Option<i64>,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl CommentListQuery {
    pub fn filter(&self) -> CommentFilter {
        CommentFilter {
            post_id: self.post,
            active: self.active,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            created_from: self.created_from,
            created_to: self.created_to,
        }
    }
}

fn validate_body(raw: &str) -> std::result::Result<String, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Empty { field: "body" });
    }
    Ok(raw.to_owned())
}

fn validate_tags(raw: &[String]) -> std::result::Result<Vec<TagName>, ValidationError> {
    raw.iter().map(|t| TagName::new(t)).collect()
}

/// Editor-facing operations
pub struct Admin<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> Admin<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    // Authors

    pub async fn create_author(&self, draft: &AuthorDraft) -> Result<Author> {
        let username = Username::new(&draft.username)?;
        let author = self
            .store
            .create_author(NewAuthor {
                username,
                display_name: draft.display_name.trim().to_owned(),
            })
            .await?;
        tracing::info!(author_id = author.id, username = %author.username, "author created");
        Ok(author)
    }

    pub async fn get_author(&self, id: i64) -> Result<Author> {
        Ok(self.store.get_author(id).await?)
    }

    /// Removes the author and everything they wrote.
    pub async fn delete_author(&self, id: i64) -> Result<()> {
        Ok(self.store.delete_author(id).await?)
    }

    // Categories

    pub async fn list_categories(&self, search: Option<&str>) -> Result<Vec<Category>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.store.list_categories(search).await?)
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category> {
        let name = CategoryName::new(&draft.name)?;
        Ok(self.store.create_category(name).await?)
    }

    pub async fn rename_category(&self, id: i64, draft: &CategoryDraft) -> Result<Category> {
        let name = CategoryName::new(&draft.name)?;
        Ok(self.store.rename_category(id, name).await?)
    }

    pub async fn delete_category(&self, id: i64) -> Result<()> {
        Ok(self.store.delete_category(id).await?)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        Ok(self.store.list_tags().await?)
    }

    // Posts

    /// Posts in every status, newest first.
    pub async fn list_posts(&self, query: &PostListQuery) -> Result<Paginated<Post>> {
        Ok(self
            .store
            .list_posts(&query.filter(), query.pagination())
            .await?)
    }

    pub async fn get_post(&self, id: i64) -> Result<Post> {
        Ok(self.store.get_post(id).await?)
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        let post = draft.validate()?;
        Ok(self.store.create_post(post).await?)
    }

    /// Apply the fields present in `patch`. An empty patch changes nothing.
    pub async fn update_post(&self, id: i64, patch: &PostPatch) -> Result<Post> {
        let changes = patch.validate()?;
        if changes.is_empty() {
            return self.get_post(id).await;
        }
        Ok(self.store.update_post(id, changes).await?)
    }

    /// Delete a post and all its comments.
    pub async fn delete_post(&self, id: i64) -> Result<()> {
        Ok(self.store.delete_post(id).await?)
    }

    // Comments

    /// Comments in any state, oldest first.
    pub async fn list_comments(&self, query: &CommentListQuery) -> Result<Vec<Comment>> {
        Ok(self.store.list_comments(&query.filter()).await?)
    }

    pub async fn approve_comments(&self, ids: &[i64]) -> Result<u64> {
        Moderation::new(self.store).approve_comments(ids).await
    }

    pub async fn deactivate_comments(&self, ids: &[i64]) -> Result<u64> {
        Moderation::new(self.store).deactivate_comments(ids).await
    }

    pub async fn delete_comment(&self, id: i64) -> Result<()> {
        self.store.delete_comment(id).await?;
        tracing::info!(comment_id = id, "comment deleted");
        Ok(())
    }
}
